use optimo::{ChatCompletionService, OptimizationService, OptimizeRequest, OptionSet, Provider, ProviderConfig};
use std::env;

fn run_live_tests() -> bool {
    matches!(
        env::var("RUN_LIVE_TESTS")
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase()
            .as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[tokio::test]
async fn live_openai_optimize_smoke() -> Result<(), Box<dyn std::error::Error>> {
    if !run_live_tests() {
        eprintln!("Skipping live provider smoke test (RUN_LIVE_TESTS not enabled).");
        return Ok(());
    }

    let key = env::var("OPENAI_API_KEY")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .expect("RUN_LIVE_TESTS is enabled, but OPENAI_API_KEY is missing");
    let model = env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string());

    let service = ChatCompletionService::new(ProviderConfig::new(Provider::OpenAI, key).with_model(model))?;

    let reply = service
        .optimize(&OptimizeRequest::new(
            "tell me about rust",
            OptionSet::new().with_length("Concise"),
        ))
        .await?;

    assert!(reply.success, "provider error: {:?}", reply.error);
    assert!(!reply.optimized_prompt.unwrap_or_default().trim().is_empty());
    Ok(())
}
