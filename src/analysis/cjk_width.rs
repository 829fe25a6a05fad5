//! CJK width folding filter / 全角半角折叠
//!
//! Full-width ASCII variants fold to basic Latin, half-width katakana fold
//! to their full-width forms (with voiced/semi-voiced marks combined).

use std::borrow::Cow;

use tantivy::tokenizer::{Token, TokenFilter, TokenStream, Tokenizer};

/// Full-width forms for U+FF65..=U+FF9F / 半角片假名映射表
const KANA_NORM: [u32; 59] = [
    0x30fb, 0x30f2, 0x30a1, 0x30a3, 0x30a5, 0x30a7, 0x30a9, 0x30e3, 0x30e5, 0x30e7, 0x30c3,
    0x30fc, 0x30a2, 0x30a4, 0x30a6, 0x30a8, 0x30aa, 0x30ab, 0x30ad, 0x30af, 0x30b1, 0x30b3,
    0x30b5, 0x30b7, 0x30b9, 0x30bb, 0x30bd, 0x30bf, 0x30c1, 0x30c4, 0x30c6, 0x30c8, 0x30ca,
    0x30cb, 0x30cc, 0x30cd, 0x30ce, 0x30cf, 0x30d2, 0x30d5, 0x30d8, 0x30db, 0x30de, 0x30df,
    0x30e0, 0x30e1, 0x30e2, 0x30e4, 0x30e6, 0x30e8, 0x30e9, 0x30ea, 0x30eb, 0x30ec, 0x30ed,
    0x30ef, 0x30f3, 0x3099, 0x309a,
];

const HALF_VOICED: char = '\u{ff9e}';
const HALF_SEMI_VOICED: char = '\u{ff9f}';

fn needs_fold(c: char) -> bool {
    matches!(c, '\u{ff01}'..='\u{ff5e}' | '\u{ff65}'..='\u{ff9f}')
}

/// Try to merge a half-width sound mark into the previous kana / 合并浊音符号
fn combine(prev: char, mark: char) -> Option<char> {
    let voiced = |c: char| {
        matches!(
            c,
            'カ' | 'キ' | 'ク' | 'ケ' | 'コ' | 'サ' | 'シ' | 'ス' | 'セ' | 'ソ' | 'タ' | 'チ' | 'ツ' | 'テ' | 'ト'
        )
    };
    let hahifuheho = |c: char| matches!(c, 'ハ' | 'ヒ' | 'フ' | 'ヘ' | 'ホ');
    let shifted = match mark {
        HALF_VOICED if prev == 'ウ' => return Some('ヴ'),
        HALF_VOICED if voiced(prev) || hahifuheho(prev) => prev as u32 + 1,
        HALF_SEMI_VOICED if hahifuheho(prev) => prev as u32 + 2,
        _ => return None,
    };
    char::from_u32(shifted)
}

/// Fold full-width ASCII and half-width katakana / 宽度折叠
pub fn fold_width(text: &str) -> Cow<'_, str> {
    if !text.chars().any(needs_fold) {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\u{ff01}'..='\u{ff5e}' => {
                out.push(char::from_u32(c as u32 - 0xfee0).unwrap_or(c));
            }
            HALF_VOICED | HALF_SEMI_VOICED => {
                let merged = out.chars().last().and_then(|prev| combine(prev, c));
                match merged {
                    Some(m) => {
                        out.pop();
                        out.push(m);
                    }
                    None => out.push(kana(c)),
                }
            }
            '\u{ff65}'..='\u{ff9d}' => out.push(kana(c)),
            _ => out.push(c),
        }
    }
    Cow::Owned(out)
}

fn kana(c: char) -> char {
    let idx = (c as u32 - 0xff65) as usize;
    KANA_NORM
        .get(idx)
        .and_then(|&cp| char::from_u32(cp))
        .unwrap_or(c)
}

/// Token filter applying [`fold_width`] / 宽度折叠过滤器
#[derive(Clone, Copy, Debug, Default)]
pub struct CjkWidthFilter;

impl TokenFilter for CjkWidthFilter {
    type Tokenizer<T: Tokenizer> = CjkWidthFilterWrapper<T>;

    fn transform<T: Tokenizer>(self, tokenizer: T) -> Self::Tokenizer<T> {
        CjkWidthFilterWrapper(tokenizer)
    }
}

#[derive(Clone)]
pub struct CjkWidthFilterWrapper<T>(T);

impl<T: Tokenizer> Tokenizer for CjkWidthFilterWrapper<T> {
    type TokenStream<'a> = CjkWidthTokenStream<T::TokenStream<'a>>;

    fn token_stream<'a>(&'a mut self, text: &'a str) -> Self::TokenStream<'a> {
        CjkWidthTokenStream {
            tail: self.0.token_stream(text),
        }
    }
}

pub struct CjkWidthTokenStream<T> {
    tail: T,
}

impl<T: TokenStream> TokenStream for CjkWidthTokenStream<T> {
    fn advance(&mut self) -> bool {
        if !self.tail.advance() {
            return false;
        }
        let token = self.tail.token_mut();
        if let Cow::Owned(folded) = fold_width(&token.text) {
            token.text = folded;
        }
        true
    }

    fn token(&self) -> &Token {
        self.tail.token()
    }

    fn token_mut(&mut self) -> &mut Token {
        self.tail.token_mut()
    }
}
