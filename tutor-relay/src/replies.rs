//! Canned texts: the priming instruction, the greeting reply, and the
//! keyword-selected fallbacks used when the upstream model is unavailable.

/// Topic-priming instruction: lesson material plus answering rules.
pub const PRIMING_INSTRUCTION: &str = include_str!("prompts/priming.txt");

pub const GREETING_REPLY: &str = "Xin chào! Tôi là trợ giảng môn Tư tưởng Hồ Chí Minh. Tôi có thể giúp bạn tìm hiểu về: độc lập dân tộc, chủ nghĩa xã hội, và tư tưởng Hồ Chí Minh. Bạn có câu hỏi gì không?";

pub const HCM_THOUGHT_REPLY: &str = "Tư tưởng Hồ Chí Minh là hệ thống quan điểm toàn diện và sâu sắc về những vấn đề cơ bản của cách mạng Việt Nam, trong đó nổi bật là tư tưởng về độc lập dân tộc gắn liền với chủ nghĩa xã hội. Theo Người, CNXH là một xã hội do nhân dân làm chủ, kinh tế phát triển, văn hóa - đạo đức tiến bộ, con người được giải phóng và có cuộc sống ấm no, hạnh phúc.";

pub const INDEPENDENCE_REPLY: &str = "Độc lập dân tộc theo tư tưởng Hồ Chí Minh không chỉ là thoát khỏi ách thống trị ngoại bang mà còn bao hàm cả hòa bình, thống nhất, tự do và hạnh phúc cho nhân dân. Độc lập dân tộc là tiền đề để xây dựng chủ nghĩa xã hội, và ngược lại, CNXH bảo đảm vững chắc cho nền độc lập dân tộc.";

pub const SOCIALISM_REPLY: &str = "Chủ nghĩa xã hội theo Hồ Chí Minh là một xã hội: do nhân dân làm chủ; có nền kinh tế phát triển cao dựa trên lực lượng sản xuất hiện đại; thực hiện phân phối theo lao động; có nhà nước của dân, do dân, vì dân; có nền văn hóa - đạo đức tiến bộ; và con người được giải phóng toàn diện, có cuộc sống ấm no, hạnh phúc.";

pub const GENERIC_REPLY: &str = "Xin chào! Tôi là trợ giảng môn Tư tưởng Hồ Chí Minh. Tôi có thể giúp bạn tìm hiểu về: độc lập dân tộc, chủ nghĩa xã hội, tư tưởng Hồ Chí Minh về CNXH, xây dựng CNXH ở Việt Nam, và mối quan hệ giữa độc lập dân tộc với CNXH. Bạn có câu hỏi cụ thể nào về các chủ đề này không?";

/// A keyword-triggered canned answer.
#[derive(Debug, Clone, Copy)]
pub struct FallbackRule {
    pub keywords: &'static [&'static str],
    pub reply: &'static str,
}

impl FallbackRule {
    /// `normalized` must already be lowercased.
    pub fn matches(&self, normalized: &str) -> bool {
        self.keywords.iter().any(|k| normalized.contains(k))
    }
}

/// Evaluated in order; the first matching rule wins.
pub const FALLBACK_RULES: &[FallbackRule] = &[
    FallbackRule {
        keywords: &["tư tưởng", "hồ chí minh"],
        reply: HCM_THOUGHT_REPLY,
    },
    FallbackRule {
        keywords: &["độc lập", "dân tộc"],
        reply: INDEPENDENCE_REPLY,
    },
    FallbackRule {
        keywords: &["cnxh", "chủ nghĩa xã hội"],
        reply: SOCIALISM_REPLY,
    },
];

/// Lowercase and trim a message for keyword matching.
pub fn normalize(message: &str) -> String {
    message.trim().to_lowercase()
}

/// Whole-word greeting tokens. "chào" also covers "xin chào".
pub const GREETING_TOKENS: &[&str] = &["hi", "hello", "hey", "chào"];

/// Whether the message contains a greeting token as a whole word.
pub fn is_greeting(message: &str) -> bool {
    normalize(message)
        .split(|c: char| !c.is_alphanumeric())
        .any(|word| GREETING_TOKENS.contains(&word))
}

/// Pick the canned answer for a message. Never empty.
pub fn fallback_reply(message: &str) -> &'static str {
    let normalized = normalize(message);
    FALLBACK_RULES
        .iter()
        .find(|rule| rule.matches(&normalized))
        .map_or(GENERIC_REPLY, |rule| rule.reply)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_greetings_detected() {
        assert!(is_greeting("hello"));
        assert!(is_greeting("Hi!"));
        assert!(is_greeting("  HEY there"));
        assert!(is_greeting("Xin chào"));
        assert!(is_greeting("chào bạn, cho mình hỏi"));
    }

    #[test]
    fn test_greeting_requires_whole_word() {
        assert!(!is_greeting("quyền thiêng liêng là gì?"));
        assert!(!is_greeting("this is a question"));
        assert!(!is_greeting("Độc lập dân tộc là gì?"));
        assert!(!is_greeting("they said"));
    }

    #[test]
    fn test_fallback_rule_order() {
        assert_eq!(fallback_reply("Tư tưởng Hồ Chí Minh là gì?"), HCM_THOUGHT_REPLY);
        assert_eq!(fallback_reply("Độc lập có ý nghĩa gì?"), INDEPENDENCE_REPLY);
        assert_eq!(fallback_reply("CNXH là gì"), SOCIALISM_REPLY);
        assert_eq!(fallback_reply("chủ nghĩa xã hội"), SOCIALISM_REPLY);
        // Earlier rules win when several match.
        assert_eq!(
            fallback_reply("tư tưởng về độc lập dân tộc"),
            HCM_THOUGHT_REPLY
        );
    }

    #[test]
    fn test_fallback_default() {
        assert_eq!(fallback_reply("thời tiết hôm nay thế nào"), GENERIC_REPLY);
        assert_eq!(fallback_reply(""), GENERIC_REPLY);
    }

    #[test]
    fn test_canned_texts_are_non_empty() {
        assert!(!GREETING_REPLY.is_empty());
        assert!(!GENERIC_REPLY.is_empty());
        assert!(FALLBACK_RULES.iter().all(|r| !r.reply.is_empty()));
    }

    #[test]
    fn test_priming_instruction_contains_lesson_and_rules() {
        assert!(PRIMING_INSTRUCTION.contains("QUY TẮC"));
        assert!(PRIMING_INSTRUCTION.contains("NỘI DUNG BÀI HỌC"));
        assert!(PRIMING_INSTRUCTION.contains("3.3. Quan hệ giữa Độc lập dân tộc và CNXH"));
    }
}
