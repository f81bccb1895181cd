//! Plain-text renderings sized for a single Telegram message.

use std::fmt::Write;

use serde::Serialize;

use crate::models::{InterviewGuide, ResumeRecord};

/// Telegram rejects messages over 4096 characters; stay under with margin.
pub const MESSAGE_LIMIT: usize = 4000;

pub fn format_resume(data: &ResumeRecord) -> String {
    let mut out = String::from("📄 RESUME ANALYSIS\n\n");

    let personal = &data.personal_info;
    let contact = [
        ("Name", &personal.name),
        ("Email", &personal.email),
        ("Phone", &personal.phone),
        ("Location", &personal.location),
        ("LinkedIn", &personal.linkedin),
        ("GitHub", &personal.github),
    ];
    if contact.iter().any(|(_, v)| present(v).is_some()) {
        out.push_str("👤 Personal Information:\n");
        for (label, value) in contact {
            if let Some(value) = present(value) {
                let _ = writeln!(out, "• {label}: {value}");
            }
        }
        out.push('\n');
    }

    if let Some(summary) = present(&data.summary) {
        let _ = write!(out, "📝 Summary:\n{summary}\n\n");
    }

    if !data.experience.is_empty() {
        out.push_str("💼 Work Experience:\n");
        for exp in &data.experience {
            let _ = writeln!(
                out,
                "• {} at {}",
                or_na(&exp.position),
                or_na(&exp.company)
            );
            if let Some(duration) = present(&exp.duration) {
                let _ = writeln!(out, "  Duration: {duration}");
            }
            if let Some(location) = present(&exp.location) {
                let _ = writeln!(out, "  Location: {location}");
            }
            if !exp.responsibilities.is_empty() {
                out.push_str("  Key responsibilities:\n");
                for resp in exp.responsibilities.iter().take(3) {
                    let _ = writeln!(out, "    - {resp}");
                }
            }
            out.push('\n');
        }
    }

    if !data.education.is_empty() {
        out.push_str("🎓 Education:\n");
        for edu in &data.education {
            let _ = writeln!(
                out,
                "• {} from {}",
                or_na(&edu.degree),
                or_na(&edu.institution)
            );
            if let Some(date) = present(&edu.graduation_date) {
                let _ = writeln!(out, "  Graduated: {date}");
            }
            if let Some(gpa) = present(&edu.gpa) {
                let _ = writeln!(out, "  GPA: {gpa}");
            }
        }
        out.push('\n');
    }

    let skills = &data.skills;
    let skill_lines = [
        ("Technical", &skills.technical, 10),
        ("Programming", &skills.languages, 8),
        ("Tools", &skills.tools, 8),
    ];
    if skill_lines.iter().any(|(_, items, _)| !items.is_empty()) {
        out.push_str("🛠️ Skills:\n");
        for (label, items, cap) in skill_lines {
            if !items.is_empty() {
                let shown: Vec<&str> = items.iter().take(cap).map(String::as_str).collect();
                let _ = writeln!(out, "• {label}: {}", shown.join(", "));
            }
        }
        out.push('\n');
    }

    truncate_chars(out.trim_end(), MESSAGE_LIMIT).to_string()
}

pub fn format_interview_guide(guide: &InterviewGuide) -> String {
    let mut out = String::from("🎯 INTERVIEW PREPARATION GUIDE\n\n");

    if !guide.likely_questions.is_empty() {
        out.push_str("❓ Likely Interview Questions:\n");
        for (i, q) in guide.likely_questions.iter().take(5).enumerate() {
            let _ = writeln!(out, "{}. {}", i + 1, or_na_str(&q.question));
            let _ = writeln!(out, "   Category: {}", or_na_str(&q.category));
            if !q.key_points.is_empty() {
                let points: Vec<&str> = q.key_points.iter().take(3).map(String::as_str).collect();
                let _ = writeln!(out, "   Key points: {}", points.join(", "));
            }
            out.push('\n');
        }
    }

    if !guide.strengths_to_highlight.is_empty() {
        out.push_str("💪 Your Key Strengths:\n");
        for s in guide.strengths_to_highlight.iter().take(3) {
            let _ = writeln!(out, "• {}", or_na_str(&s.strength));
            let _ = writeln!(out, "  Evidence: {}\n", or_na_str(&s.evidence));
        }
    }

    if !guide.technical_preparation.is_empty() {
        out.push_str("🔧 Technical Preparation:\n");
        for tech in guide.technical_preparation.iter().take(3) {
            let _ = writeln!(out, "• {}", or_na_str(&tech.skill));
            if let Some(first) = tech.depth_questions.first() {
                let _ = writeln!(out, "  Expect: {first}");
            }
            out.push('\n');
        }
    }

    if !guide.questions_to_ask.is_empty() {
        out.push_str("🤔 Questions You Should Ask:\n");
        for (i, q) in guide.questions_to_ask.iter().take(3).enumerate() {
            let _ = writeln!(out, "{}. {q}", i + 1);
        }
        out.push('\n');
    }

    truncate_chars(out.trim_end(), MESSAGE_LIMIT).to_string()
}

/// Pretty JSON for export. Serialization of our own models cannot fail in
/// practice; the error path still yields valid JSON.
pub fn to_pretty_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| format!("{{\"error\": \"{e}\"}}"))
}

/// Cuts `s` to at most `max_chars` characters, never inside a code point.
pub fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn or_na(value: &Option<String>) -> &str {
    present(value).unwrap_or("N/A")
}

fn or_na_str(value: &str) -> &str {
    if value.trim().is_empty() {
        "N/A"
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::interview::{LikelyQuestion, TechnicalTopic};
    use crate::models::resume::{Education, Experience, Skills};

    fn sample_resume() -> ResumeRecord {
        let mut record = ResumeRecord::default();
        record.personal_info.name = Some("Jane Doe".to_string());
        record.personal_info.email = Some("jane@example.com".to_string());
        record.summary = Some("Systems engineer.".to_string());
        record.experience = vec![Experience {
            company: Some("Acme".to_string()),
            position: Some("Engineer".to_string()),
            duration: Some("2020 - Present".to_string()),
            responsibilities: (1..=5).map(|i| format!("Did thing {i}")).collect(),
            ..Default::default()
        }];
        record.education = vec![Education {
            institution: Some("MIT".to_string()),
            degree: None,
            ..Default::default()
        }];
        record.skills = Skills {
            technical: (1..=12).map(|i| format!("skill{i}")).collect(),
            ..Default::default()
        };
        record
    }

    #[test]
    fn test_format_resume_sections_and_caps() {
        let text = format_resume(&sample_resume());
        assert!(text.starts_with("📄 RESUME ANALYSIS"));
        assert!(text.contains("• Name: Jane Doe"));
        assert!(text.contains("• Engineer at Acme"));
        assert!(text.contains("Did thing 3"));
        assert!(!text.contains("Did thing 4"));
        assert!(text.contains("• N/A from MIT"));
        assert!(text.contains("skill10"));
        assert!(!text.contains("skill11"));
        assert!(!text.contains("Phone"));
    }

    #[test]
    fn test_format_resume_empty_record_is_header_only() {
        assert_eq!(format_resume(&ResumeRecord::default()), "📄 RESUME ANALYSIS");
    }

    #[test]
    fn test_format_resume_respects_message_limit() {
        let mut record = sample_resume();
        record.summary = Some("é".repeat(10_000));
        let text = format_resume(&record);
        assert_eq!(text.chars().count(), MESSAGE_LIMIT);
    }

    #[test]
    fn test_format_interview_guide() {
        let guide = InterviewGuide {
            likely_questions: (1..=6)
                .map(|i| LikelyQuestion {
                    question: format!("Question {i}"),
                    category: "technical".to_string(),
                    key_points: vec!["a".into(), "b".into(), "c".into(), "d".into()],
                    ..Default::default()
                })
                .collect(),
            technical_preparation: vec![TechnicalTopic {
                skill: "Rust".to_string(),
                depth_questions: vec!["Explain ownership".to_string()],
                ..Default::default()
            }],
            questions_to_ask: vec!["What is the on-call like?".to_string()],
            ..Default::default()
        };
        let text = format_interview_guide(&guide);
        assert!(text.contains("5. Question 5"));
        assert!(!text.contains("Question 6"));
        assert!(text.contains("Key points: a, b, c"));
        assert!(text.contains("Expect: Explain ownership"));
        assert!(text.contains("1. What is the on-call like?"));
    }

    #[test]
    fn test_truncate_chars_on_multibyte() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("hi", 10), "hi");
    }
}
