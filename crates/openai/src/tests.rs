// Unit tests for the completion client

#[cfg(test)]
mod url_tests {
    use crate::completions_url;

    #[test]
    fn test_strips_v1_suffix() {
        assert_eq!(
            completions_url("http://ollama:11434/v1"),
            "http://ollama:11434/v1/completions"
        );
    }

    #[test]
    fn test_strips_trailing_slash() {
        assert_eq!(
            completions_url("http://ollama:11434/v1/"),
            "http://ollama:11434/v1/completions"
        );
        assert_eq!(
            completions_url("http://ollama:11434/"),
            "http://ollama:11434/v1/completions"
        );
    }

    #[test]
    fn test_root_without_v1() {
        assert_eq!(
            completions_url("https://llm.example.com/proxy"),
            "https://llm.example.com/proxy/v1/completions"
        );
    }

    #[test]
    fn test_inner_v1_is_kept() {
        assert_eq!(
            completions_url("https://gw.example.com/v1/tenant/v1"),
            "https://gw.example.com/v1/tenant/v1/completions"
        );
    }
}

#[cfg(test)]
mod client_tests {
    use promptrun_core::error::AgentError;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::{CompletionClient, CompletionOptions, OpenAiCompletionClient};

    fn options() -> CompletionOptions {
        CompletionOptions::new(0.2, 800)
    }

    #[tokio::test]
    async fn test_sends_request_and_returns_first_choice() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/completions"))
            .and(body_json(json!({
                "model": "llama3.2:latest",
                "prompt": "Say hi",
                "temperature": 0.2,
                "max_tokens": 800
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "cmpl-1",
                "choices": [{"text": "hi", "index": 0}, {"text": "ignored"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = OpenAiCompletionClient::new("llama3.2:latest");
        let text = client
            .complete(&format!("{}/v1", server.uri()), "Say hi", &options())
            .await
            .unwrap();

        assert_eq!(text.as_deref(), Some("hi"));
    }

    #[tokio::test]
    async fn test_empty_choices_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
            .mount(&server)
            .await;

        let text = OpenAiCompletionClient::new("m")
            .complete(&server.uri(), "prompt", &options())
            .await
            .unwrap();

        assert_eq!(text, None);
    }

    #[tokio::test]
    async fn test_non_success_is_backend_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("model loading"))
            .mount(&server)
            .await;

        let err = OpenAiCompletionClient::new("m")
            .complete(&server.uri(), "prompt", &options())
            .await
            .unwrap_err();

        match err {
            AgentError::Backend { status, body } => {
                assert_eq!(status, 503);
                assert_eq!(body, "model loading");
            }
            other => panic!("expected backend error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_malformed_body_is_protocol_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = OpenAiCompletionClient::new("m")
            .complete(&server.uri(), "prompt", &options())
            .await
            .unwrap_err();

        assert!(matches!(err, AgentError::Protocol(_)));
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_transport_error() {
        let err = OpenAiCompletionClient::new("m")
            .complete("http://127.0.0.1:9/v1", "prompt", &options())
            .await
            .unwrap_err();

        assert!(matches!(err, AgentError::Transport(_)));
    }

    #[tokio::test]
    async fn test_api_key_sent_as_bearer() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("authorization", "Bearer secret-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"text": "ok"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let text = OpenAiCompletionClient::new("m")
            .with_api_key("secret-key")
            .complete(&server.uri(), "prompt", &options())
            .await
            .unwrap();

        assert_eq!(text.as_deref(), Some("ok"));
    }

    #[test]
    fn test_debug_redacts_key() {
        let client = OpenAiCompletionClient::new("m").with_api_key("secret-key");
        let debug = format!("{client:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("secret-key"));
    }
}
