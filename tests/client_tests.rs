mod common;

use std::time::Duration;

use common::{client, generated, handle, location, MockEndpoint, MockStore};
use docext::client::PollSettings;
use docext::error::{DocextError, ErrorKind};
use docext::prompt::format_prompt;
use docext::types::{FailureReason, GenerationRequest, GenerationResult};
use pretty_assertions::assert_eq;

fn request(prompt: &str) -> GenerationRequest {
    GenerationRequest::builder().prompt(prompt).build()
}

#[tokio::test]
async fn sync_invoke_returns_generated_text() {
    let endpoint = MockEndpoint::new();
    let store = MockStore::new();
    endpoint.queue_text("hello");

    let result = client(&endpoint, &store)
        .invoke_sync(&request("say hello"))
        .await
        .unwrap();

    assert_eq!(result, GenerationResult::Text("hello".into()));
    assert_eq!(endpoint.sync_calls(), 1);
    assert_eq!(endpoint.async_calls(), 0);
}

#[tokio::test]
async fn sync_invoke_wraps_prompt_in_chat_template() {
    let endpoint = MockEndpoint::new();
    endpoint.queue_text("ok");
    let client = client(&endpoint, &MockStore::new()).with_system_prompt("Be terse.");

    client.invoke_sync(&request("What is 2+2?")).await.unwrap();

    let envelope = &endpoint.envelopes()[0];
    assert_eq!(envelope.inputs, format_prompt("Be terse.", "What is 2+2?"));
    assert_eq!(envelope.parameters.max_new_tokens, 2048);
    assert!(!envelope.parameters.return_full_text);
}

#[tokio::test]
async fn without_chat_template_sends_prompt_verbatim() {
    let endpoint = MockEndpoint::new();
    endpoint.queue_text("ok");
    let client = client(&endpoint, &MockStore::new()).without_chat_template();

    client.invoke_sync(&request("raw prompt")).await.unwrap();

    assert_eq!(endpoint.envelopes()[0].inputs, "raw prompt");
}

#[tokio::test]
async fn sync_invoke_strips_echoed_prompt() {
    let endpoint = MockEndpoint::new();
    endpoint.queue_text("raw prompt\n{\"a\": 1}");
    let client = client(&endpoint, &MockStore::new()).without_chat_template();

    let text = client
        .invoke_sync(&request("raw prompt"))
        .await
        .unwrap()
        .into_text()
        .unwrap();

    assert_eq!(text, "{\"a\": 1}");
}

#[tokio::test]
async fn sync_invoke_surfaces_service_errors_without_retry() {
    let endpoint = MockEndpoint::new();
    endpoint.queue_sync(Err(DocextError::api(503, "overloaded")));

    let err = client(&endpoint, &MockStore::new())
        .invoke_sync(&request("x"))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Service);
    assert_eq!(endpoint.sync_calls(), 1);
}

#[tokio::test]
async fn sync_invoke_rejects_malformed_envelope() {
    let endpoint = MockEndpoint::new();
    endpoint.queue_sync(Ok(br#"{"outputs": "?"}"#.to_vec()));

    let err = client(&endpoint, &MockStore::new())
        .invoke_sync(&request("x"))
        .await
        .unwrap_err();

    assert!(matches!(err, DocextError::MalformedEnvelope(_)));
}

#[tokio::test]
async fn invalid_parameters_are_rejected_before_any_call() {
    let endpoint = MockEndpoint::new();
    let client = client(&endpoint, &MockStore::new());
    let bad = GenerationRequest::builder().prompt("x").temperature(1.5).build();

    let err = client.infer(&bad, true).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    assert_eq!(endpoint.sync_calls(), 0);
    assert_eq!(endpoint.async_calls(), 0);
}

#[tokio::test]
async fn submit_returns_handle_from_endpoint() {
    let endpoint = MockEndpoint::new();
    endpoint.queue_async(Ok(handle("out/abc.out")));

    let submitted = client(&endpoint, &MockStore::new())
        .submit_async(&request("x"))
        .await
        .unwrap();

    assert_eq!(submitted.location, location("out/abc.out"));
}

#[tokio::test(start_paused = true)]
async fn await_result_returns_text_once_object_appears() {
    let store = MockStore::new();
    store.queue_missing(3);
    store.put(location("out/1.out"), generated("{\"a\": 1}"));

    let result = client(&MockEndpoint::new(), &store)
        .await_result(
            &handle("out/1.out"),
            Duration::from_secs(60),
            Duration::from_secs(5),
        )
        .await
        .unwrap();

    assert_eq!(result, GenerationResult::Text("{\"a\": 1}".into()));
    assert_eq!(store.polls(), 4);
}

#[tokio::test(start_paused = true)]
async fn await_result_times_out_after_bounded_polls() {
    let store = MockStore::new();
    let client = client(&MockEndpoint::new(), &store);

    let result = client
        .await_result(
            &handle("out/never.out"),
            Duration::from_secs(300),
            Duration::from_secs(5),
        )
        .await
        .unwrap();

    match result {
        GenerationResult::Failure(FailureReason::Timeout {
            waited,
            attempts,
            location: loc,
        }) => {
            assert!(attempts <= 60, "polled {attempts} times");
            assert_eq!(attempts as usize, store.polls());
            assert!(waited >= Duration::from_secs(300));
            assert_eq!(loc, location("out/never.out"));
        }
        other => panic!("expected timeout, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn timeout_not_a_multiple_of_interval_rounds_polls_up() {
    let store = MockStore::new();
    let client = client(&MockEndpoint::new(), &store);

    let result = client
        .await_result(
            &handle("out/never.out"),
            Duration::from_secs(12),
            Duration::from_secs(5),
        )
        .await
        .unwrap();

    assert!(!result.is_text());
    assert_eq!(store.polls(), 3);
}

#[tokio::test(start_paused = true)]
async fn polling_never_suspends_past_the_timeout() {
    for (timeout_secs, interval_secs, max_polls) in [(3, 5, 1), (12, 5, 3), (10, 3, 4)] {
        let store = MockStore::new();
        let client = client(&MockEndpoint::new(), &store);
        let timeout = Duration::from_secs(timeout_secs);

        let started = tokio::time::Instant::now();
        let result = client
            .await_result(
                &handle("out/never.out"),
                timeout,
                Duration::from_secs(interval_secs),
            )
            .await
            .unwrap();
        let elapsed = started.elapsed();

        assert!(
            matches!(result, GenerationResult::Failure(FailureReason::Timeout { .. })),
            "T={timeout_secs}s p={interval_secs}s"
        );
        assert!(
            elapsed <= timeout,
            "T={timeout_secs}s p={interval_secs}s suspended for {elapsed:?}"
        );
        assert!(store.polls() <= max_polls, "polled {} times", store.polls());
    }
}

#[tokio::test(start_paused = true)]
async fn zero_timeout_still_polls_once() {
    let store = MockStore::new();
    store.put(location("out/ready.out"), generated("done"));

    let result = client(&MockEndpoint::new(), &store)
        .await_result(&handle("out/ready.out"), Duration::ZERO, Duration::from_secs(5))
        .await
        .unwrap();

    assert_eq!(result.as_text(), Some("done"));
    assert_eq!(store.polls(), 1);
}

#[tokio::test]
async fn zero_poll_interval_is_invalid() {
    let store = MockStore::new();
    let err = client(&MockEndpoint::new(), &store)
        .await_result(&handle("out/x.out"), Duration::from_secs(10), Duration::ZERO)
        .await
        .unwrap_err();

    assert!(matches!(err, DocextError::InvalidArgument(_)));
    assert_eq!(store.polls(), 0);
}

#[tokio::test(start_paused = true)]
async fn store_errors_other_than_not_found_stop_polling() {
    let store = MockStore::new();
    store.queue_missing(1);
    store.queue_fetch(Err(DocextError::storage("s3://results/out/x.out", "access denied")));
    store.put(location("out/x.out"), generated("unreachable"));

    let err = client(&MockEndpoint::new(), &store)
        .await_result(
            &handle("out/x.out"),
            Duration::from_secs(60),
            Duration::from_secs(5),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, DocextError::Storage { .. }));
    assert_eq!(store.polls(), 2);
}

#[tokio::test(start_paused = true)]
async fn repeated_polls_of_same_handle_agree() {
    let store = MockStore::new();
    store.put(location("out/same.out"), generated("stable"));
    let client = client(&MockEndpoint::new(), &store);
    let handle = handle("out/same.out");

    let first = client
        .await_result(&handle, Duration::from_secs(10), Duration::from_secs(1))
        .await
        .unwrap();
    let second = client
        .await_result(&handle, Duration::from_secs(10), Duration::from_secs(1))
        .await
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(first.as_text(), Some("stable"));
}

#[tokio::test(start_paused = true)]
async fn infer_async_submits_then_polls() {
    let endpoint = MockEndpoint::new();
    let store = MockStore::new();
    endpoint.queue_async(Ok(handle("out/a.out")));
    store.queue_missing(2);
    store.put(location("out/a.out"), generated("async text"));

    let result = client(&endpoint, &store)
        .with_polling(PollSettings {
            interval: Duration::from_secs(1),
            timeout: Duration::from_secs(30),
        })
        .infer(&request("x"), true)
        .await
        .unwrap();

    assert_eq!(result.as_text(), Some("async text"));
    assert_eq!(endpoint.async_calls(), 1);
    assert_eq!(endpoint.sync_calls(), 0);
    assert_eq!(store.polls(), 3);
}

#[tokio::test]
async fn failed_submission_falls_back_to_sync_exactly_once() {
    let endpoint = MockEndpoint::new();
    endpoint.queue_async(Err(DocextError::api(500, "async disabled")));
    endpoint.queue_text("from sync");

    let result = client(&endpoint, &MockStore::new())
        .infer(&request("x"), true)
        .await
        .unwrap();

    assert_eq!(result.as_text(), Some("from sync"));
    assert_eq!(endpoint.async_calls(), 1);
    assert_eq!(endpoint.sync_calls(), 1);
}

#[tokio::test]
async fn fallback_failure_is_returned_without_further_attempts() {
    let endpoint = MockEndpoint::new();
    endpoint.queue_async(Err(DocextError::api(500, "async disabled")));
    endpoint.queue_sync(Err(DocextError::api(502, "bad gateway")));

    let err = client(&endpoint, &MockStore::new())
        .infer(&request("x"), true)
        .await
        .unwrap_err();

    assert!(matches!(err, DocextError::Api { status: 502, .. }));
    assert_eq!(endpoint.async_calls(), 1);
    assert_eq!(endpoint.sync_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn poll_timeout_does_not_trigger_fallback() {
    let endpoint = MockEndpoint::new();
    endpoint.queue_async(Ok(handle("out/slow.out")));

    let result = client(&endpoint, &MockStore::new())
        .with_polling(PollSettings {
            interval: Duration::from_secs(5),
            timeout: Duration::from_secs(20),
        })
        .infer(&request("x"), true)
        .await
        .unwrap();

    assert!(matches!(
        result,
        GenerationResult::Failure(FailureReason::Timeout { .. })
    ));
    assert_eq!(endpoint.sync_calls(), 0);
    assert!(result.into_text().unwrap_err().is_retryable());
}

#[tokio::test]
async fn prefer_sync_never_submits() {
    let endpoint = MockEndpoint::new();
    endpoint.queue_text("direct");

    let result = client(&endpoint, &MockStore::new())
        .infer_prompt("x", false)
        .await
        .unwrap();

    assert_eq!(result.as_text(), Some("direct"));
    assert_eq!(endpoint.async_calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn batch_runs_in_order_and_continues_past_failures() {
    let endpoint = MockEndpoint::new();
    endpoint.queue_text("one");
    endpoint.queue_sync(Err(DocextError::api(500, "boom")));
    endpoint.queue_text("three");
    let client = client(&endpoint, &MockStore::new())
        .without_chat_template()
        .with_batch_delay(Duration::from_secs(1));

    let requests = vec![request("a"), request("b"), request("c")];
    let started = tokio::time::Instant::now();
    let results = client.batch_infer(&requests, false).await;

    assert_eq!(results.len(), 3);
    assert_eq!(results[0].as_ref().unwrap().as_text(), Some("one"));
    assert!(results[1].is_err());
    assert_eq!(results[2].as_ref().unwrap().as_text(), Some("three"));
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_secs(2) && elapsed < Duration::from_secs(3));

    let inputs: Vec<_> = endpoint
        .envelopes()
        .into_iter()
        .map(|e| e.inputs)
        .collect();
    assert_eq!(inputs, vec!["a", "b", "c"]);
}

#[tokio::test]
async fn empty_batch_returns_no_results() {
    let endpoint = MockEndpoint::new();
    let results = client(&endpoint, &MockStore::new())
        .batch_infer(&[], true)
        .await;
    assert!(results.is_empty());
    assert_eq!(endpoint.async_calls(), 0);
}

#[tokio::test]
async fn client_without_store_uses_sync_and_refuses_to_poll() {
    let endpoint = MockEndpoint::new();
    endpoint.queue_text("direct");
    let client = docext::client::InferenceClient::sync_only(Box::new(endpoint.clone()));
    assert!(!client.has_store());

    let result = client.infer_prompt("x", true).await.unwrap();
    assert_eq!(result.as_text(), Some("direct"));
    assert_eq!(endpoint.async_calls(), 0);
    assert_eq!(endpoint.sync_calls(), 1);

    let err = client
        .await_result(&handle("out/x.out"), Duration::from_secs(1), Duration::from_secs(1))
        .await
        .unwrap_err();
    assert!(matches!(err, DocextError::Configuration(_)));
}
