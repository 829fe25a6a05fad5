//! Analysis registry / 分析器注册表
//!
//! Tokenizers and analyzers are registered explicitly during bootstrap and
//! installed into every index the engine opens. Field mappings refer to
//! them by name.

mod cjk_width;
mod jieba;

pub use cjk_width::{fold_width, CjkWidthFilter};
pub use jieba::{JiebaTokenizer, Segmenter, Token, TokenKind};

use std::collections::HashMap;

use tantivy::tokenizer::{LowerCaser, TextAnalyzer, TokenizerManager};
use thiserror::Error;

pub const JIEBA_TOKENIZER: &str = "jieba_tokenizer";
pub const JIEBA_ANALYZER: &str = "jieba";

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("tokenizer not registered: {0}")]
    UnknownTokenizer(String),
}

/// Named tokenizers and analyzers / 分词器与分析器
#[derive(Default, Clone)]
pub struct AnalysisRegistry {
    tokenizers: HashMap<String, JiebaTokenizer>,
    analyzers: HashMap<String, TextAnalyzer>,
}

impl AnalysisRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_tokenizer(&mut self, name: &str, tokenizer: JiebaTokenizer) {
        self.tokenizers.insert(name.to_string(), tokenizer);
    }

    pub fn register_analyzer(&mut self, name: &str, analyzer: TextAnalyzer) {
        self.analyzers.insert(name.to_string(), analyzer);
    }

    pub fn tokenizer(&self, name: &str) -> Result<JiebaTokenizer, AnalysisError> {
        self.tokenizers
            .get(name)
            .cloned()
            .ok_or_else(|| AnalysisError::UnknownTokenizer(name.to_string()))
    }

    pub fn contains_analyzer(&self, name: &str) -> bool {
        self.analyzers.contains_key(name)
    }

    /// Register everything into an index's tokenizer manager / 安装到索引
    pub fn install(&self, manager: &TokenizerManager) {
        for (name, tokenizer) in &self.tokenizers {
            manager.register(name, tokenizer.clone());
        }
        for (name, analyzer) in &self.analyzers {
            manager.register(name, analyzer.clone());
        }
    }
}

/// Register `jieba_tokenizer` and the `jieba` analyzer / 注册 jieba 分析器
///
/// The analyzer chains the tokenizer, width folding and lowercasing. Calling
/// this again on the same registry is a no-op.
pub fn register_jieba(registry: &mut AnalysisRegistry) -> Result<(), AnalysisError> {
    if registry.contains_analyzer(JIEBA_ANALYZER) {
        return Ok(());
    }
    if !registry.tokenizers.contains_key(JIEBA_TOKENIZER) {
        registry.register_tokenizer(JIEBA_TOKENIZER, JiebaTokenizer::new());
    }

    let tokenizer = registry.tokenizer(JIEBA_TOKENIZER)?;
    let analyzer = TextAnalyzer::builder(tokenizer)
        .filter(CjkWidthFilter)
        .filter(LowerCaser)
        .build();
    registry.register_analyzer(JIEBA_ANALYZER, analyzer);

    tracing::info!("Analyzer registered: {} ({})", JIEBA_ANALYZER, JIEBA_TOKENIZER);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tantivy::tokenizer::TokenStream;

    fn analyze(registry: &AnalysisRegistry, name: &str, text: &str) -> Vec<String> {
        let manager = TokenizerManager::default();
        registry.install(&manager);
        let mut analyzer = manager.get(name).unwrap();
        let mut stream = analyzer.token_stream(text);
        let mut out = Vec::new();
        while stream.advance() {
            out.push(stream.token().text.clone());
        }
        out
    }

    #[test]
    fn test_register_jieba_is_idempotent() {
        let mut registry = AnalysisRegistry::new();
        register_jieba(&mut registry).unwrap();
        register_jieba(&mut registry).unwrap();
        assert_eq!(registry.analyzers.len(), 1);
        assert_eq!(registry.tokenizers.len(), 1);
        assert!(registry.contains_analyzer(JIEBA_ANALYZER));
    }

    #[test]
    fn test_jieba_analyzer_folds_and_lowercases() {
        let mut registry = AnalysisRegistry::new();
        register_jieba(&mut registry).unwrap();
        let tokens = analyze(&registry, JIEBA_ANALYZER, "HELLO 中国 Ａ");
        assert!(tokens.contains(&"hello".to_string()), "{tokens:?}");
        assert!(tokens.contains(&"中国".to_string()), "{tokens:?}");
        assert!(tokens.contains(&"a".to_string()), "{tokens:?}");
    }

    #[test]
    fn test_unknown_tokenizer() {
        let registry = AnalysisRegistry::new();
        assert!(matches!(
            registry.tokenizer("missing"),
            Err(AnalysisError::UnknownTokenizer(name)) if name == "missing"
        ));
    }
}
