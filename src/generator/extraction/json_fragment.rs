//! 从模型输出中截取JSON片段
//!
//! 模型经常在JSON外面包一层说明文字或markdown代码块，这里只负责找出
//! 括号配平的数组/对象子串，是否是合法JSON由调用方解析判断。

/// 返回第一个括号配平的JSON数组或对象子串
pub fn first_balanced_json(text: &str) -> Option<&str> {
    balanced_json_fragments(text).next()
}

/// 按起始位置依次返回所有括号配平的子串
///
/// 字符串内的括号与转义引号不参与配平。每个起始括号都会单独尝试，
/// 因此嵌套在前一个片段内部的子片段也会出现在结果中。
pub fn balanced_json_fragments(text: &str) -> impl Iterator<Item = &str> {
    let mut search_from = 0;
    std::iter::from_fn(move || {
        while let Some(offset) = text[search_from..].find(['[', '{']) {
            let start = search_from + offset;
            search_from = start + 1;
            if let Some(end) = balanced_end(text, start) {
                return Some(&text[start..end]);
            }
        }
        None
    })
}

/// 从start处的起始括号开始配平，返回结束位置（不含）
fn balanced_end(text: &str, start: usize) -> Option<usize> {
    let mut expected: Vec<char> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '[' => expected.push(']'),
            '{' => expected.push('}'),
            ']' | '}' => {
                if expected.pop() != Some(ch) {
                    return None;
                }
                if expected.is_empty() {
                    return Some(start + offset + ch.len_utf8());
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_array() {
        assert_eq!(first_balanced_json(r#"[{"a":1}]"#), Some(r#"[{"a":1}]"#));
    }

    #[test]
    fn test_array_inside_prose_and_fence() {
        let text = "Here are the investors:\n```json\n[{\"full_name\": \"Jane Doe\"}]\n```\nLet me know!";
        assert_eq!(
            first_balanced_json(text),
            Some("[{\"full_name\": \"Jane Doe\"}]")
        );
    }

    #[test]
    fn test_object_fragment() {
        let text = r#"Result: {"full_name": "Jane", "tags": ["a", "b"]} done"#;
        assert_eq!(
            first_balanced_json(text),
            Some(r#"{"full_name": "Jane", "tags": ["a", "b"]}"#)
        );
    }

    #[test]
    fn test_brackets_inside_strings_are_ignored() {
        let text = r#"[{"note": "uses ] and } and \" quotes [x"}] trailing"#;
        assert_eq!(
            first_balanced_json(text),
            Some(r#"[{"note": "uses ] and } and \" quotes [x"}]"#)
        );
    }

    #[test]
    fn test_first_fragment_wins() {
        let text = r#"[{"n": 1}] and later [{"n": 2}]"#;
        assert_eq!(first_balanced_json(text), Some(r#"[{"n": 1}]"#));
    }

    #[test]
    fn test_unbalanced_opener_is_skipped() {
        let text = r#"see note [1 then {"full_name": "Jane"}"#;
        assert_eq!(first_balanced_json(text), Some(r#"{"full_name": "Jane"}"#));
    }

    #[test]
    fn test_fragments_in_order() {
        let text = r#"Sources [1] then [{"n": 1}]"#;
        let fragments: Vec<&str> = balanced_json_fragments(text).collect();
        assert_eq!(fragments, vec!["[1]", r#"[{"n": 1}]"#, r#"{"n": 1}"#]);
    }

    #[test]
    fn test_mismatched_closer_rejected() {
        assert_eq!(first_balanced_json("[}"), None);
    }

    #[test]
    fn test_no_json() {
        assert_eq!(first_balanced_json(""), None);
        assert_eq!(first_balanced_json("I could not find any investors."), None);
        assert_eq!(first_balanced_json("[unterminated"), None);
    }

    #[test]
    fn test_multibyte_text_around_fragment() {
        let text = "投资人列表：[{\"full_name\": \"José Núñez\"}]。";
        assert_eq!(
            first_balanced_json(text),
            Some("[{\"full_name\": \"José Núñez\"}]")
        );
    }
}
