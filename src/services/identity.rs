//! 身份识别服务 - 业务能力层
//!
//! 只负责从首页页眉文本中找出学生姓名和学号

use regex::Regex;

use crate::error::{AppError, AppResult, ConfigError};
use crate::models::script::IdStatus;

/// 身份识别结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub student_name: String,
    pub registration_number: String,
    pub id_status: IdStatus,
    /// 页眉中找到的所有不同学号候选（按出现顺序）
    pub candidates: Vec<String>,
}

impl Identity {
    /// 没有页眉文本时的结果
    pub fn missing() -> Self {
        Self {
            student_name: String::new(),
            registration_number: String::new(),
            id_status: IdStatus::Missing,
            candidates: Vec::new(),
        }
    }
}

/// 身份识别服务
pub struct IdentityExtractor {
    registration: Regex,
    name_patterns: Vec<Regex>,
}

impl IdentityExtractor {
    /// `registration_pattern` 描述固定长度的学号形态
    pub fn new(registration_pattern: &str) -> AppResult<Self> {
        let registration = Regex::new(registration_pattern).map_err(|source| {
            AppError::Config(ConfigError::InvalidPattern {
                pattern: registration_pattern.to_string(),
                source,
            })
        })?;

        // 依次尝试：带标签的姓名、"Student Name"、行首两个首字母大写的单词
        let name_patterns = [
            r"(?m)[Nn]ame\s*:?\s*([A-Za-z][A-Za-z \t\.]+?)\s*(?:\n|[Rr]eg|$)",
            r"(?m)Student\s*[Nn]ame\s*:?\s*([A-Za-z][A-Za-z \t\.]+?)\s*(?:\n|[Rr]eg|$)",
            r"(?m)^\s*([A-Z][a-z]+\s+[A-Z][a-z]+)",
        ]
        .iter()
        .filter_map(|p| Regex::new(p).ok())
        .collect();

        Ok(Self {
            registration,
            name_patterns,
        })
    }

    /// 从页眉文本中提取身份
    ///
    /// - 恰好一个学号候选 → VALID
    /// - 没有候选 → MISSING
    /// - 多个不同候选 → AMBIGUOUS，取第一个作为尽力值
    ///
    /// 姓名提取从不报错，找不到时为空字符串
    pub fn extract(&self, header_text: &str) -> Identity {
        let candidates = self.registration_candidates(header_text);

        let id_status = match candidates.len() {
            0 => IdStatus::Missing,
            1 => IdStatus::Valid,
            _ => IdStatus::Ambiguous,
        };

        Identity {
            student_name: self.extract_name(header_text),
            registration_number: candidates.first().cloned().unwrap_or_default(),
            id_status,
            candidates,
        }
    }

    fn registration_candidates(&self, text: &str) -> Vec<String> {
        let mut distinct: Vec<String> = Vec::new();
        for m in self.registration.find_iter(text) {
            let candidate = m.as_str().trim().to_string();
            if !candidate.is_empty() && !distinct.contains(&candidate) {
                distinct.push(candidate);
            }
        }
        distinct
    }

    fn extract_name(&self, text: &str) -> String {
        for pattern in &self.name_patterns {
            let Some(captures) = pattern.captures(text) else {
                continue;
            };
            let Some(raw) = captures.get(1) else {
                continue;
            };

            // 清理 OCR 常见噪声，只保留字母、空白和点
            let cleaned: String = raw
                .as_str()
                .chars()
                .filter(|c| c.is_ascii_alphabetic() || *c == ' ' || *c == '.')
                .collect();
            let cleaned = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");

            if cleaned.chars().filter(|c| c.is_ascii_alphabetic()).count() > 3 {
                return cleaned;
            }
        }
        String::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> IdentityExtractor {
        IdentityExtractor::new(r"\b[0-9]{6,10}\b").unwrap()
    }

    #[test]
    fn test_single_registration_is_valid() {
        let identity = extractor().extract("Name: Rahim Uddin\nReg No: 2021331045\n");
        assert_eq!(identity.id_status, IdStatus::Valid);
        assert_eq!(identity.registration_number, "2021331045");
        assert_eq!(identity.student_name, "Rahim Uddin");
    }

    #[test]
    fn test_no_registration_is_missing() {
        let identity = extractor().extract("Name: Karim\nReg No: ____\n");
        assert_eq!(identity.id_status, IdStatus::Missing);
        assert_eq!(identity.registration_number, "");
    }

    #[test]
    fn test_two_distinct_registrations_are_ambiguous() {
        let identity = extractor().extract("Reg: 2021331045  Roll: 1234567\n");
        assert_eq!(identity.id_status, IdStatus::Ambiguous);
        assert_eq!(identity.registration_number, "2021331045");
        assert_eq!(identity.candidates.len(), 2);
    }

    #[test]
    fn test_repeated_same_registration_is_valid() {
        let identity = extractor().extract("Reg: 2021331045\nID 2021331045\n");
        assert_eq!(identity.id_status, IdStatus::Valid);
    }

    #[test]
    fn test_short_numbers_are_not_registrations() {
        let identity = extractor().extract("Date: 12/05/2024  Page 1\n");
        assert_eq!(identity.id_status, IdStatus::Missing);
    }

    #[test]
    fn test_name_fallback_and_noise() {
        let extractor = extractor();
        assert_eq!(extractor.extract("Nusrat Jahan\n2021331045").student_name, "Nusrat Jahan");
        assert_eq!(extractor.extract("Name: Ab\n").student_name, "");
        assert_eq!(extractor.extract("").student_name, "");
        assert_eq!(extractor.extract("Name:   Tanvir    Ahmed \n").student_name, "Tanvir Ahmed");
        assert_eq!(
            extractor.extract("Name: Rahim Reg: 2021331045").student_name,
            "Rahim"
        );
    }

    #[test]
    fn test_invalid_pattern_is_config_error() {
        assert!(IdentityExtractor::new("([0-9]").is_err());
    }
}
