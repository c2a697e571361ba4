//! # CIF 词法分析器
//!
//! 基于 `nom` 将 CIF/STAR 文本切分为记号。
//!
//! 支持：
//! - `data_` 块头、`loop_` 关键字（大小写不敏感）
//! - 数据名 `_cell_length_a`
//! - 无引号值、单/双引号字符串（引号后须为空白才算结束）
//! - 行首 `;` 包围的多行文本块
//! - `.`（缺失）与 `?`（未知）
//! - `#` 注释
//!
//! ## 依赖关系
//! - 被 `parsers/cif/reader.rs` 使用

use nom::{
    branch::alt,
    bytes::complete::{tag_no_case, take_while, take_while1},
    character::complete::{char, multispace1, not_line_ending},
    combinator::value,
    multi::many0,
    sequence::preceded,
    IResult,
};

/// CIF 记号
#[derive(Debug, Clone, PartialEq)]
pub enum Token<'a> {
    /// data_ 块头
    DataBlock(String),
    /// loop_ 关键字
    Loop,
    /// 数据名（小写，含前导 `_`）
    DataName(String),
    /// 无引号值
    Value(&'a str),
    /// 引号字符串（不含引号）
    Quoted(&'a str),
    /// 分号文本块
    TextField(String),
    /// 缺失值 (.)
    Missing,
    /// 未知值 (?)
    Unknown,
}

impl<'a> Token<'a> {
    /// 值记号的字符串内容
    pub fn as_value(&self) -> Option<&str> {
        match self {
            Token::Value(s) | Token::Quoted(s) => Some(s),
            Token::TextField(s) => Some(s),
            Token::Missing => Some("."),
            Token::Unknown => Some("?"),
            _ => None,
        }
    }
}

/// 跳过空白和注释
fn skip_ws_comments(input: &str) -> IResult<&str, ()> {
    let (input, _) = many0(alt((
        value((), multispace1),
        value((), preceded(char('#'), not_line_ending)),
    )))(input)?;
    Ok((input, ()))
}

fn parse_data_block(input: &str) -> IResult<&str, Token<'_>> {
    let (input, _) = tag_no_case("data_")(input)?;
    let (input, name) = take_while(|c: char| !c.is_whitespace())(input)?;
    Ok((input, Token::DataBlock(name.to_string())))
}

fn parse_loop(input: &str) -> IResult<&str, Token<'_>> {
    let (input, _) = tag_no_case("loop_")(input)?;
    Ok((input, Token::Loop))
}

fn parse_data_name(input: &str) -> IResult<&str, Token<'_>> {
    let (input, _) = char('_')(input)?;
    let (input, name) = take_while1(|c: char| !c.is_whitespace())(input)?;
    Ok((input, Token::DataName(format!("_{}", name.to_lowercase()))))
}

/// 引号字符串：结束引号后必须是空白或输入结尾（允许 'O'Brien' 这类内嵌引号）
fn quoted(delim: char) -> impl Fn(&str) -> IResult<&str, Token<'_>> {
    move |input: &str| {
        let (rest, _) = char(delim)(input)?;
        let mut iter = rest.char_indices().peekable();
        while let Some((i, c)) = iter.next() {
            if c == '\n' {
                break;
            }
            if c == delim {
                let next_is_ws = iter.peek().map(|(_, n)| n.is_whitespace()).unwrap_or(true);
                if next_is_ws {
                    let content = &rest[..i];
                    return Ok((&rest[i + c.len_utf8()..], Token::Quoted(content)));
                }
            }
        }
        Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Char,
        )))
    }
}

/// 分号文本块（调用方保证 `;` 位于行首）
fn parse_text_field(input: &str) -> IResult<&str, Token<'_>> {
    let (input, _) = char(';')(input)?;
    match input.find("\n;") {
        Some(end) => {
            let content = input[..end].trim_start_matches(['\r', '\n']);
            Ok((&input[end + 2..], Token::TextField(content.trim_end().to_string())))
        }
        None => Ok(("", Token::TextField(input.trim().to_string()))),
    }
}

fn parse_unquoted_value(input: &str) -> IResult<&str, Token<'_>> {
    let (input, value) = take_while1(|c: char| !c.is_whitespace())(input)?;
    let token = match value {
        "." => Token::Missing,
        "?" => Token::Unknown,
        v => Token::Value(v),
    };
    Ok((input, token))
}

/// 将 CIF 文本切分为记号序列；无法识别的字符被跳过
pub fn tokenize(input: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut remaining = input;

    loop {
        remaining = match skip_ws_comments(remaining) {
            Ok((rest, _)) => rest,
            Err(_) => remaining,
        };
        if remaining.is_empty() {
            break;
        }

        let offset = input.len() - remaining.len();
        let at_line_start = offset == 0 || input.as_bytes()[offset - 1] == b'\n';

        let parsed = if at_line_start && remaining.starts_with(';') {
            parse_text_field(remaining)
        } else {
            alt((
                parse_data_block,
                parse_loop,
                parse_data_name,
                quoted('\''),
                quoted('"'),
                parse_unquoted_value,
            ))(remaining)
        };

        match parsed {
            Ok((rest, token)) => {
                tokens.push(token);
                remaining = rest;
            }
            Err(_) => {
                // 跳过一个字符后继续
                let skip = remaining.chars().next().map(|c| c.len_utf8()).unwrap_or(1);
                remaining = &remaining[skip..];
            }
        }
    }

    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_basic_items() {
        let tokens = tokenize("data_NaCl\n_cell_length_a 5.64(2) # comment\n_symmetry_space_group_name_H-M 'F m -3 m'\n");
        assert_eq!(tokens[0], Token::DataBlock("NaCl".to_string()));
        assert_eq!(tokens[1], Token::DataName("_cell_length_a".to_string()));
        assert_eq!(tokens[2], Token::Value("5.64(2)"));
        assert_eq!(
            tokens[3],
            Token::DataName("_symmetry_space_group_name_h-m".to_string())
        );
        assert_eq!(tokens[4], Token::Quoted("F m -3 m"));
        assert_eq!(tokens.len(), 5);
    }

    #[test]
    fn test_tokenize_loop_and_specials() {
        let tokens = tokenize("LOOP_\n_a\n_b\n. ?\n");
        assert_eq!(tokens[0], Token::Loop);
        assert_eq!(tokens[3], Token::Missing);
        assert_eq!(tokens[4], Token::Unknown);
    }

    #[test]
    fn test_quote_with_embedded_apostrophe() {
        let tokens = tokenize("_name 'O'Brien' next");
        assert_eq!(tokens[1], Token::Quoted("O'Brien"));
        assert_eq!(tokens[2], Token::Value("next"));
    }

    #[test]
    fn test_text_field() {
        let tokens = tokenize("_title\n;\nline one\nline two\n;\n_next 1\n");
        assert_eq!(
            tokens[1],
            Token::TextField("line one\nline two".to_string())
        );
        assert_eq!(tokens[2], Token::DataName("_next".to_string()));
    }

    #[test]
    fn test_semicolon_inside_line_is_a_value() {
        let tokens = tokenize("_x a;b\n");
        assert_eq!(tokens[1], Token::Value("a;b"));
    }
}
