use serde::{Deserialize, Deserializer};

/// 反序列化可选字符串，将空字符串转换为None
///
/// # 参数
/// - `deserializer`: 用于反序列化的serde反序列化器
///
/// # 返回值
/// 反序列化后的可选字符串，如果原字符串为空则返回None
pub fn deserialize_optional_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    Ok(s.filter(|s| !s.is_empty()))
}

/// 解析汇总表中的单元格，空字符串和空值标记（如 "nan"）视为缺失
pub fn parse_optional_cell(raw: &str, null_markers: &[String]) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || null_markers.iter().any(|m| m == trimmed) {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// 将表头名转换为标题格式（"training_loop" → "Training Loop"）
pub fn title_case(header: &str) -> String {
    header
        .split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_yaml;

    // 测试结构体，用于测试deserialize_optional_string函数
    #[derive(Debug, Deserialize)]
    struct TestStruct {
        #[serde(default, deserialize_with = "deserialize_optional_string")]
        field: Option<String>,
    }

    #[test]
    fn test_deserialize_optional_string_with_content() {
        let yaml = "field: test_value";
        let test: TestStruct = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(test.field, Some("test_value".to_string()));
    }

    #[test]
    fn test_deserialize_optional_string_with_empty() {
        let yaml = "field: ''";
        let test: TestStruct = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(test.field, None);
    }

    #[test]
    fn test_parse_optional_cell() {
        let markers = vec!["nan".to_string(), "None".to_string()];
        assert_eq!(parse_optional_cell("", &markers), None);
        assert_eq!(parse_optional_cell("nan", &markers), None);
        assert_eq!(parse_optional_cell(" None ", &markers), None);
        assert_eq!(parse_optional_cell("adam", &markers), Some("adam".to_string()));
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("training_loop"), "Training Loop");
        assert_eq!(title_case("create_inverse_triples"), "Create Inverse Triples");
        assert_eq!(title_case("loss"), "Loss");
    }
}
