//! Fixed analysis instructions sent with every report.

use serde_json::Value;
use shared::dto::ReportRecord;

pub const RECOMMENDATION_FIELD: &str = "recommendation";
pub const SHORT_ANSWER_FIELD: &str = "short_answer";
pub const OFFICIAL_SUMMARY_FIELD: &str = "official_summary";
pub const PRIORITY_FIELD: &str = "suggest_priority_id";

pub const PROMPT_PREAMBLE: &str = concat!(
    "Analyze the following report and return the answer in a strictly valid JSON format. ",
    "Your response must exactly follow the structure below without any additional text or commentary:\n\n",
    "{\n",
    "  \"recommendation\": \"Provide detailed recommendations for the administration on how to resolve the issue. ",
    "Include clear, step-by-step actions, resource allocation suggestions, and any necessary follow-up measures ",
    "to address the problem effectively.\",\n",
    "  \"short_answer\": \"Provide a concise response to the user who submitted the report. For example: ",
    "'We have reviewed your report and will take appropriate action as soon as possible.'. Include additional ",
    "advice only if relevant and appropriate, without transferring the responsibility of fixing the issue onto the user.\",\n",
    "  \"official_summary\": \"Summarize the report in a formal and succinct manner. Include the main issue, ",
    "a brief description of the problem, and its location or context.\",\n",
    "  \"suggest_priority_id\": \"Evaluate the severity and urgency of the issue and assign a numerical priority ",
    "accordingly. Use the following guidelines: \n",
    "    - 1 (LOW): Minor issues that have little or no impact on user safety or functionality ",
    "(e.g., a small cleaning problem or a minor cosmetic issue). \n",
    "    - 2 (MEDIUM): Issues that may moderately affect user experience or convenience but do not pose ",
    "an immediate threat (e.g., moderate delays in service or minor maintenance issues). \n",
    "    - 3 (HIGH): Problems that significantly disrupt service or create safety concerns ",
    "(e.g., major maintenance issues, safety risks on public infrastructure). \n",
    "    - 4 (CRITICAL): Urgent issues that pose an immediate danger, severe disruption, or could result ",
    "in significant harm (e.g., structural failures, accidents, or conditions that threaten lives).\"\n",
    "}\n\n",
    "Report:\n",
);

/// Preamble followed by the record as 2-space indented JSON.
pub fn build_prompt(record: &ReportRecord) -> String {
    format!("{PROMPT_PREAMBLE}{:#}", Value::Object(record.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(v: Value) -> ReportRecord {
        match v {
            Value::Object(m) => m,
            _ => unreachable!(),
        }
    }

    #[test]
    fn asks_for_exactly_the_four_fields() {
        for field in [
            RECOMMENDATION_FIELD,
            SHORT_ANSWER_FIELD,
            OFFICIAL_SUMMARY_FIELD,
            PRIORITY_FIELD,
        ] {
            assert!(PROMPT_PREAMBLE.contains(&format!("\"{field}\":")), "{field}");
        }
        assert_eq!(PROMPT_PREAMBLE.matches("\": \"").count(), 4);
    }

    #[test]
    fn rubric_tiers_are_spelled_out() {
        assert!(PROMPT_PREAMBLE.contains("1 (LOW): Minor issues"));
        assert!(PROMPT_PREAMBLE.contains("minor cosmetic issue"));
        assert!(PROMPT_PREAMBLE.contains("2 (MEDIUM)"));
        assert!(PROMPT_PREAMBLE.contains("do not pose an immediate threat"));
        assert!(PROMPT_PREAMBLE.contains("3 (HIGH)"));
        assert!(PROMPT_PREAMBLE.contains("safety concerns"));
        assert!(PROMPT_PREAMBLE.contains("4 (CRITICAL): Urgent issues that pose an immediate danger"));
        assert!(PROMPT_PREAMBLE.contains("structural failures"));
    }

    #[test]
    fn record_is_appended_as_indented_json() {
        let r = record(json!({"id": 7, "title": "Straßenlaterne defekt"}));
        let prompt = build_prompt(&r);
        assert!(prompt.starts_with(PROMPT_PREAMBLE));
        let tail = &prompt[PROMPT_PREAMBLE.len()..];
        assert_eq!(tail, "{\n  \"id\": 7,\n  \"title\": \"Straßenlaterne defekt\"\n}");
        assert_eq!(build_prompt(&r), prompt);
    }
}
