use mcp_servicenow::extract::{
    clean_title, kb_prompt, parse_reply, strip_code_fence, ExtractedArticle, ExtractedIncident,
    ExtractionError, MAX_KB_TITLE_CHARS,
};
use mcp_servicenow::model::WorkflowState;

#[test]
fn test_strip_code_fence() {
    assert_eq!(strip_code_fence("```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
    assert_eq!(strip_code_fence("Here you go:\n```\n{}\n```\nThanks"), "{}");
    assert_eq!(strip_code_fence("  {\"a\": 1}  "), "{\"a\": 1}");
}

#[test]
fn test_parse_incident_reply() {
    let incident: ExtractedIncident = parse_reply(
        r#"{"short_description": "Disk full", "urgency": 1, "impact": "2", "category": ""}"#,
    )
    .unwrap();

    assert_eq!(incident.short_description.as_deref(), Some("Disk full"));
    assert_eq!(incident.urgency.as_deref(), Some("1"));
    assert_eq!(incident.impact.as_deref(), Some("2"));
    assert_eq!(incident.category, None);

    let args = incident.into_args().unwrap();
    assert_eq!(args.short_description, "Disk full");
    assert_eq!(args.caller_id, None);
}

#[test]
fn test_parse_reply_errors() {
    assert!(matches!(
        parse_reply::<ExtractedIncident>("```json\n```"),
        Err(ExtractionError::Empty)
    ));

    let err = parse_reply::<ExtractedIncident>("not json").unwrap_err();
    assert_eq!(err.raw_output(), Some("not json"));

    assert!(matches!(
        ExtractedIncident::default().into_args(),
        Err(ExtractionError::MissingField("short_description"))
    ));
}

#[test]
fn test_parse_reply_keeps_fences_inside_json_strings() {
    let raw = r#"{"title":"Restart nginx","body_html":"<p>Run:</p>```bash\nsudo systemctl restart nginx\n```"}"#;
    let article: ExtractedArticle = parse_reply(raw).unwrap();

    assert_eq!(article.title.as_deref(), Some("Restart nginx"));
    assert!(article.body_html.unwrap().contains("```bash"));

    let fenced: ExtractedArticle =
        parse_reply("Here you go:\n```json\n{\"title\": \"T\"}\n```").unwrap();
    assert_eq!(fenced.title.as_deref(), Some("T"));
}

#[test]
fn test_clean_title() {
    assert_eq!(clean_title("  \"Reset your password\" "), "Reset your password");

    let long = "word ".repeat(30);
    let cleaned = clean_title(&long);
    assert!(cleaned.chars().count() <= MAX_KB_TITLE_CHARS);
    assert!(!cleaned.ends_with(' '));
}

#[test]
fn test_article_into_draft_args() {
    let article = ExtractedArticle {
        title: Some("\"VPN\"".to_string()),
        body_html: Some("<p>x</p>".to_string()),
    };
    let args = article.into_args(Some("kb1".to_string())).unwrap();

    assert_eq!(args.short_description, "VPN");
    assert_eq!(args.workflow_state, Some(WorkflowState::Draft));
    assert_eq!(args.kb_knowledge_base.as_deref(), Some("kb1"));

    let missing_body = ExtractedArticle {
        title: Some("t".to_string()),
        body_html: None,
    };
    assert!(matches!(
        missing_body.into_args(None),
        Err(ExtractionError::MissingField("body_html"))
    ));
}

#[test]
fn test_kb_prompt_mentions_audience_and_source() {
    let prompt = kb_prompt("restart the service", "IT Staff");
    assert!(prompt.contains("Target Audience: IT Staff"));
    assert!(prompt.contains("restart the service"));
    assert!(prompt.contains("body_html"));
}
