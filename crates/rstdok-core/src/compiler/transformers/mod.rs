//! Transformers run by the default [`TransformerPass`]

pub mod contents;
pub mod link_targets;
pub mod menu;
pub mod variables;

use super::TransformerPass;

pub use contents::ContentsTransformer;
pub use link_targets::CollectLinkTargetsTransformer;
pub use menu::MenuNodeTransformer;
pub use variables::VariableInlineTransformer;

/// Transformer pass with every built-in transformer
pub fn default_transformer_pass() -> TransformerPass {
    let mut pass = TransformerPass::new();
    pass.add_transformer(Box::new(CollectLinkTargetsTransformer::default()));
    pass.add_transformer(Box::new(VariableInlineTransformer::default()));
    pass.add_transformer(Box::new(MenuNodeTransformer));
    pass.add_transformer(Box::new(ContentsTransformer::default()));
    pass
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_order() {
        assert_eq!(
            default_transformer_pass().transformer_names(),
            vec!["collect_link_targets", "variable_inline", "menu_node", "contents"]
        );
    }
}
