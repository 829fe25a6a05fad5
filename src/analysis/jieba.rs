//! Jieba word segmentation tokenizer / jieba 中文分词器
//!
//! Wraps a dictionary-based segmenter and exposes it two ways: as a plain
//! `tokenize` call producing byte-offset tokens, and as a tantivy
//! `Tokenizer` that analyzers can chain filters onto.

use std::sync::Arc;

use jieba_rs::Jieba;
use once_cell::sync::Lazy;
use tantivy::tokenizer::{Token as EngineToken, TokenStream, Tokenizer};

/// Shared default dictionary, loaded once / 全局默认词典
static JIEBA: Lazy<Arc<Jieba>> = Lazy::new(|| Arc::new(Jieba::new()));

/// Word segmentation capability / 分词能力
pub trait Segmenter: Send + Sync {
    /// Cut text into words covering the input in order / 按顺序切分文本
    fn cut<'a>(&self, text: &'a str) -> Vec<&'a str>;
}

impl Segmenter for Jieba {
    fn cut<'a>(&self, text: &'a str) -> Vec<&'a str> {
        // Exact mode with HMM for out-of-vocabulary words
        Jieba::cut(self, text, true)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Ideographic,
}

/// One segmented word with byte offsets / 分词结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub term: String,
    pub start: usize,
    pub end: usize,
    /// 1-based running index / 从 1 开始的序号
    pub position: usize,
    pub kind: TokenKind,
}

#[derive(Clone)]
pub struct JiebaTokenizer {
    segmenter: Arc<dyn Segmenter>,
}

impl JiebaTokenizer {
    pub fn new() -> Self {
        Self {
            segmenter: JIEBA.clone(),
        }
    }

    pub fn with_segmenter(segmenter: Arc<dyn Segmenter>) -> Self {
        Self { segmenter }
    }

    /// Segment text into consecutive, non-overlapping tokens / 分词
    pub fn tokenize(&self, text: &str) -> Vec<Token> {
        let mut start = 0;
        self.segmenter
            .cut(text)
            .into_iter()
            .enumerate()
            .map(|(i, word)| {
                let end = start + word.len();
                let token = Token {
                    term: word.to_string(),
                    start,
                    end,
                    position: i + 1,
                    kind: TokenKind::Ideographic,
                };
                start = end;
                token
            })
            .collect()
    }

    /// Drop this tokenizer's handle on its segmenter / 释放分词器句柄
    ///
    /// Consumes the tokenizer, so it can run at most once. The default
    /// dictionary is shared by the whole process and is never unloaded;
    /// closing only lets go of this handle.
    pub fn close(self) {
        drop(self.segmenter);
    }
}

impl Default for JiebaTokenizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Tokenizer for JiebaTokenizer {
    type TokenStream<'a> = JiebaTokenStream;

    fn token_stream<'a>(&'a mut self, text: &'a str) -> Self::TokenStream<'a> {
        let tokens = self
            .tokenize(text)
            .into_iter()
            .filter(|t| !t.term.trim().is_empty())
            .enumerate()
            .map(|(position, t)| EngineToken {
                offset_from: t.start,
                offset_to: t.end,
                position,
                text: t.term,
                ..EngineToken::default()
            })
            .collect();
        JiebaTokenStream { tokens, index: 0 }
    }
}

pub struct JiebaTokenStream {
    tokens: Vec<EngineToken>,
    index: usize,
}

impl TokenStream for JiebaTokenStream {
    fn advance(&mut self) -> bool {
        if self.index < self.tokens.len() {
            self.index += 1;
            true
        } else {
            false
        }
    }

    fn token(&self) -> &EngineToken {
        &self.tokens[self.index - 1]
    }

    fn token_mut(&mut self) -> &mut EngineToken {
        &mut self.tokens[self.index - 1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_reconstructs_input() {
        let tok = JiebaTokenizer::new();
        let text = "我们中出了一个叛徒 hello, 世界！";
        let tokens = tok.tokenize(text);
        assert!(!tokens.is_empty());

        let mut rebuilt = String::new();
        let mut cursor = 0;
        for (i, t) in tokens.iter().enumerate() {
            assert_eq!(t.start, cursor, "gap or overlap before {:?}", t.term);
            assert_eq!(t.position, i + 1);
            assert_eq!(t.kind, TokenKind::Ideographic);
            rebuilt.push_str(&text[t.start..t.end]);
            cursor = t.end;
        }
        assert_eq!(cursor, text.len());
        assert_eq!(rebuilt, text);
    }

    #[test]
    fn test_tokenize_empty() {
        assert!(JiebaTokenizer::new().tokenize("").is_empty());
    }

    struct Fixed;

    impl Segmenter for Fixed {
        fn cut<'a>(&self, text: &'a str) -> Vec<&'a str> {
            text.split_inclusive(' ').collect()
        }
    }

    #[test]
    fn test_custom_segmenter_offsets() {
        let tok = JiebaTokenizer::with_segmenter(Arc::new(Fixed));
        let tokens = tok.tokenize("ab cd");
        assert_eq!(tokens.len(), 2);
        assert_eq!((tokens[0].start, tokens[0].end), (0, 3));
        assert_eq!((tokens[1].start, tokens[1].end), (3, 5));
        tok.close();
    }

    #[test]
    fn test_close_keeps_shared_dictionary() {
        let first = JiebaTokenizer::new();
        let clone = first.clone();
        first.close();
        assert_eq!(clone.tokenize("北京").len(), 1);
        clone.close();

        let fresh = JiebaTokenizer::new();
        assert_eq!(fresh.tokenize("北京")[0].term, "北京");
    }

    #[test]
    fn test_token_stream_skips_whitespace() {
        let mut tok = JiebaTokenizer::new();
        let mut stream = tok.token_stream("北京 大学");
        let mut texts = Vec::new();
        let mut positions = Vec::new();
        while stream.advance() {
            texts.push(stream.token().text.clone());
            positions.push(stream.token().position);
        }
        assert!(texts.iter().all(|t| !t.trim().is_empty()));
        assert_eq!(texts.concat(), "北京大学");
        assert_eq!(positions, (0..texts.len()).collect::<Vec<_>>());
    }
}
