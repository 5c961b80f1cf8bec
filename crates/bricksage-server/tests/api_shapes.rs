//! API shape tests — validates that response JSON keeps the field names
//! and types a frontend client depends on.

/// Verify the stats response shape:
/// { sets, themes, embeddings, embeddingDimension, dbSizeMb, ... }
#[test]
fn test_stats_response_shape() {
    let stats_json = serde_json::json!({
        "sets": 120,
        "themes": 14,
        "embeddings": 118,
        "embeddingDimension": 384,
        "dbSizeMb": 0.6,
        "matrixLoaded": true,
        "matrixRows": 118,
        "semanticSearchAvailable": true,
        "catalogProviders": ["brickset", "rebrickable", "brickowl"],
    });

    assert!(stats_json["sets"].is_number());
    assert!(stats_json["themes"].is_number());
    assert!(stats_json["embeddings"].is_number());
    assert!(stats_json["embeddingDimension"].is_number());
    assert!(stats_json["dbSizeMb"].is_number());
    assert!(stats_json["semanticSearchAvailable"].is_boolean());
    assert!(stats_json["catalogProviders"].is_array());
}

/// Verify the server-info response shape.
#[test]
fn test_server_info_shape() {
    let info = serde_json::json!({
        "hostname": "brickbox",
        "ip": "192.168.1.50",
        "port": 8501,
        "url": "http://192.168.1.50:8501",
        "platform": "linux",
        "arch": "x86_64",
    });

    assert!(info["ip"].is_string());
    assert!(info["port"].is_number());
    assert!(info["url"].is_string());
}

/// Verify the search response: flattened set fields plus metadata.
#[test]
fn test_search_response_shape() {
    let response = serde_json::json!({
        "results": [
            {
                "set_id": "75192",
                "name": "Millennium Falcon",
                "theme": "Star Wars",
                "piece_count": 7541,
                "price": 849.99,
                "release_year": 2017,
            }
        ],
        "total": 1,
        "query": "millennium falcon",
        "search_type": "hybrid",
        "parsed": {
            "original": "millennium falcon",
            "keywords": ["millennium", "falcon"],
        },
    });

    assert!(response["results"].is_array());
    assert!(response["query"].is_string());
    assert!(response["search_type"].is_string());
    assert!(response["total"].is_number());

    let result = &response["results"][0];
    assert!(result["set_id"].is_string());
    assert!(result["name"].is_string());
    assert!(result["piece_count"].is_number());
}

/// Verify the chat response shape the chat view renders:
/// { message, model, sets, tokensUsed, duration }
#[test]
fn test_chat_response_shape() {
    use bricksage_chat::ChatResponse;
    use bricksage_core::LegoSet;

    let response = ChatResponse {
        message: "The Colosseum has 9036 pieces.".into(),
        model: "gpt-4".into(),
        sets: vec![LegoSet {
            set_id: "10276".into(),
            name: "Colosseum".into(),
            theme: "Creator Expert".into(),
            piece_count: 9036,
            price: Some(549.99),
            release_year: Some(2020),
            description: None,
        }],
        tokens_used: Some(250),
        duration: Some(1870),
    };

    let json = serde_json::to_value(&response).unwrap();
    assert!(json["message"].is_string());
    assert!(json["model"].is_string());
    assert!(json["sets"].is_array());
    assert_eq!(json["sets"][0]["set_id"], "10276");
    assert!(json["tokensUsed"].is_number());
    assert!(json["duration"].is_number());
}

/// Verify stream events serialize with the tagged `type` field.
#[test]
fn test_stream_event_shapes() {
    use bricksage_chat::StreamEvent;

    let token = serde_json::to_value(StreamEvent::Token {
        content: "The".into(),
    })
    .unwrap();
    assert_eq!(token["type"], "token");
    assert_eq!(token["content"], "The");

    let done = serde_json::to_value(StreamEvent::Done {
        model: "gpt-4".into(),
        tokens_used: 42,
        duration: 900,
    })
    .unwrap();
    assert_eq!(done["type"], "done");
    assert_eq!(done["tokensUsed"], 42);

    let error = serde_json::to_value(StreamEvent::Error {
        error: "boom".into(),
    })
    .unwrap();
    assert_eq!(error["type"], "error");
}

/// Verify the masked LLM config response never carries key material.
#[test]
fn test_config_response_masks_keys() {
    use bricksage_chat::LLMConfig;

    let config = LLMConfig {
        openai_api_key: Some("sk-super-secret".into()),
        ..Default::default()
    };
    let json = serde_json::to_value(config.to_response()).unwrap();

    assert_eq!(json["openaiConfigured"], true);
    assert_eq!(json["anthropicConfigured"], false);
    assert!(json["openaiModel"].is_string());
    assert!(!serde_json::to_string(&json).unwrap().contains("sk-super-secret"));
}

/// Verify chat request parsing defaults.
#[test]
fn test_chat_request_defaults() {
    use bricksage_chat::ChatRequest;

    let req: ChatRequest =
        serde_json::from_str(r#"{ "message": "oldest star wars set?" }"#).unwrap();
    assert_eq!(req.message, "oldest star wars set?");
    assert!(req.use_context);
    assert!(req.live_search);
    assert_eq!(req.top_k, 5);
    assert!(req.conversation_history.is_empty());
}
