mod common;

use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{submission, Harness};
use ragtrace::classifier::{EntailmentProvider, MockClassifier};
use ragtrace::config::ClassifierConfig;
use ragtrace::error::RagTraceError;
use ragtrace::models::EntailmentLabel;
use ragtrace::scoring::GroundednessScorer;
use ragtrace::services::TraceEvent;

async fn record(h: &Harness, text: &str, evidence: &[Option<&str>]) -> i64 {
    let outcome = h
        .ingestion
        .record(submission(text, evidence))
        .await
        .expect("record");
    outcome.trace.responses[0].response.id
}

#[tokio::test]
async fn test_restated_evidence_scores_fully_grounded() {
    let h = Harness::new().await;
    let response_id = record(
        &h,
        "The Eiffel Tower is in Paris. It opened in 1889.",
        &[Some("The Eiffel Tower is in Paris. It opened in 1889.")],
    )
    .await;

    let check = h
        .scorer(MockClassifier::new())
        .score_response(response_id)
        .await
        .expect("score")
        .expect("response exists");

    assert_eq!(check.groundedness_score, 1.0);
    assert!(check.unsupported_sentences.is_empty());
    assert_eq!(check.entailment_results.len(), 2);
    assert!(check
        .entailment_results
        .iter()
        .all(|r| r.label == EntailmentLabel::Entailment));
}

#[tokio::test]
async fn test_retrievals_without_text_score_zero() {
    let h = Harness::new().await;
    let response_id = record(&h, "The tower is in Paris. It is tall.", &[None, None]).await;
    let mock = MockClassifier::new();

    let check = h
        .scorer(mock.clone())
        .score_response(response_id)
        .await
        .expect("score")
        .expect("response exists");

    assert_eq!(check.groundedness_score, 0.0);
    assert_eq!(
        check.unsupported_sentences,
        vec!["The tower is in Paris".to_string(), "It is tall".to_string()]
    );
    assert!(check.entailment_results.is_empty());
    assert_eq!(mock.calls(), 0);
}

#[tokio::test]
async fn test_empty_response_scores_zero() {
    let h = Harness::new().await;
    let response_id = record(&h, " . . ", &[Some("anything")]).await;

    let check = h
        .scorer(MockClassifier::new())
        .score_response(response_id)
        .await
        .expect("score")
        .expect("response exists");

    assert_eq!(check.groundedness_score, 0.0);
    assert!(check.unsupported_sentences.is_empty());
    assert!(check.entailment_results.is_empty());
}

#[tokio::test]
async fn test_partial_support_and_short_circuit() {
    let h = Harness::new().await;
    let response_id = record(
        &h,
        "Paris is the capital. The moon is cheese.",
        &[
            Some("Unrelated text about trains."),
            Some("Paris is the capital of France."),
            Some("Paris is the capital city."),
        ],
    )
    .await;
    let mock = MockClassifier::new();

    let check = h
        .scorer(mock.clone())
        .score_response(response_id)
        .await
        .expect("score")
        .expect("response exists");

    assert_eq!(check.groundedness_score, 0.5);
    assert_eq!(check.unsupported_sentences, vec!["The moon is cheese".to_string()]);

    // First sentence stops at the second evidence, the second tries all three.
    let pairs: Vec<(&str, &str)> = check
        .entailment_results
        .iter()
        .map(|r| (r.sentence.as_str(), r.evidence.as_str()))
        .collect();
    assert_eq!(
        pairs,
        vec![
            ("Paris is the capital", "Unrelated text about trains."),
            ("Paris is the capital", "Paris is the capital of France."),
            ("The moon is cheese", "Unrelated text about trains."),
            ("The moon is cheese", "Paris is the capital of France."),
            ("The moon is cheese", "Paris is the capital city."),
        ]
    );
    assert_eq!(mock.calls(), 5);
}

#[tokio::test]
async fn test_entailment_at_threshold_is_not_support() {
    let h = Harness::new().await;
    let response_id = record(&h, "Paris is in France.", &[Some("Paris is in France.")]).await;

    let check = h
        .scorer(MockClassifier::new().with_entailment_score(0.7))
        .score_response(response_id)
        .await
        .expect("score")
        .expect("response exists");

    assert_eq!(check.groundedness_score, 0.0);
    assert_eq!(check.entailment_results[0].label, EntailmentLabel::Entailment);
    assert_eq!(check.unsupported_sentences, vec!["Paris is in France".to_string()]);
}

#[tokio::test]
async fn test_rescoring_appends_checks() {
    let h = Harness::new().await;
    let response_id = record(&h, "Paris is in France.", &[Some("Paris is in France.")]).await;
    let scorer = h.scorer(MockClassifier::new());

    let first = scorer
        .score_response(response_id)
        .await
        .expect("score")
        .expect("check");
    let second = scorer
        .score_response(response_id)
        .await
        .expect("score")
        .expect("check");

    assert_ne!(first.id, second.id);
    let checks = h.query.list_checks(response_id).await.expect("list");
    assert_eq!(
        checks.iter().map(|c| c.id).collect::<Vec<_>>(),
        vec![first.id, second.id]
    );

    let page = h.query.list_traces(None, None).await.expect("list");
    assert_eq!(page.traces[0].responses[0].hallucination_checks.len(), 2);
}

#[tokio::test]
async fn test_classifier_failure_writes_no_check() {
    let h = Harness::new().await;
    let response_id = record(
        &h,
        "Paris is in France. Berlin is in Germany.",
        &[Some("Paris is in France."), Some("BROKEN evidence")],
    )
    .await;

    let err = h
        .scorer(MockClassifier::new().failing_on("BROKEN"))
        .score_response(response_id)
        .await
        .expect_err("classifier failure should abort");

    assert!(matches!(err, RagTraceError::Classifier(_)));
    assert_eq!(h.count("hallucination_checks").await, 0);
}

#[tokio::test]
async fn test_missing_response_is_a_silent_no_op() {
    let h = Harness::new().await;
    let result = h
        .scorer(MockClassifier::new())
        .score_response(4242)
        .await
        .expect("no error");
    assert!(result.is_none());
    assert_eq!(h.count("hallucination_checks").await, 0);
}

#[tokio::test]
async fn test_check_recorded_event_is_published() {
    let h = Harness::new().await;
    let response_id = record(&h, "Paris is in France.", &[Some("Paris is in France.")]).await;
    let mut rx = h.events.subscribe();

    let check = h
        .scorer(MockClassifier::new())
        .score_response(response_id)
        .await
        .expect("score")
        .expect("check");

    match rx.recv().await.expect("event") {
        TraceEvent::CheckRecorded {
            response_id: event_response,
            check_id,
            groundedness_score,
            ..
        } => {
            assert_eq!(event_response, response_id);
            assert_eq!(check_id, check.id);
            assert_eq!(groundedness_score, 1.0);
        }
        other => panic!("unexpected event: {other:?}"),
    }
}

#[tokio::test]
async fn test_http_classifier_end_to_end() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/roberta-large-mnli"))
        .and(header("authorization", "Bearer hf_test"))
        .and(body_partial_json(json!({
            "inputs": {"text": "Paris is in France", "text_pair": "Paris is the capital of France."}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([[
            {"label": "ENTAILMENT", "score": 0.97},
            {"label": "NEUTRAL", "score": 0.02},
            {"label": "CONTRADICTION", "score": 0.01}
        ]])))
        .expect(1)
        .mount(&server)
        .await;

    let h = Harness::new().await;
    let response_id = record(
        &h,
        "Paris is in France.",
        &[Some("Paris is the capital of France.")],
    )
    .await;

    let provider = EntailmentProvider::new(&ClassifierConfig {
        model: "huggingface/roberta-large-mnli".to_string(),
        api_key: Some("hf_test".to_string()),
        base_url: Some(server.uri()),
        timeout_secs: Some(5),
    });
    let scorer = GroundednessScorer::new(h.db.clone(), provider);

    let check = scorer
        .score_response(response_id)
        .await
        .expect("score")
        .expect("check");

    assert_eq!(check.groundedness_score, 1.0);
    assert_eq!(check.entailment_results[0].score, 0.97);
}
