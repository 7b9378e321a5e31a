use rstdok_ast::DocumentNode;

use crate::compiler::{CompilerContext, CompilerPass};
use crate::diagnostics::codes;
use crate::error::CompilerError;

/// Reports toctree entries naming unknown documents, and documents no
/// toctree includes
pub struct ToctreeValidationPass;

impl CompilerPass for ToctreeValidationPass {
    fn name(&self) -> &'static str {
        "toctree_validation"
    }

    fn priority(&self) -> i32 {
        100
    }

    fn run(
        &mut self,
        documents: Vec<DocumentNode>,
        context: &mut CompilerContext<'_>,
    ) -> Result<Vec<DocumentNode>, CompilerError> {
        let project = &*context.project;
        for entry in project.documents.values() {
            for file in entry.toctrees.iter().flatten() {
                if !project.documents.contains_key(file) {
                    context.reporter.warning(
                        codes::MISSING_TOCTREE_ENTRY,
                        &entry.file,
                        None,
                        format!("Toctree contains reference to nonexisting document '{}'", file),
                    );
                }
            }

            if !entry.is_root && entry.parent.is_none() && !entry.orphan {
                context.reporter.warning(
                    codes::ORPHAN_DOCUMENT,
                    &entry.file,
                    None,
                    "Document isn't included in any toctree",
                );
            }
        }
        Ok(documents)
    }
}
