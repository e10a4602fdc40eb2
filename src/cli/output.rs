//! CLI output formatting utilities

use crate::models::RecommendationResult;
use crate::rag::PipelineRun;
use crate::AppConfig;

/// Truncate at a character boundary, appending "..." when shortened
#[must_use]
pub fn truncate_str(s: &str, max_chars: usize) -> String {
    if s.chars().count() > max_chars {
        let truncated: String = s.chars().take(max_chars).collect();
        format!("{truncated}...")
    } else {
        s.to_string()
    }
}

pub fn print_recommendation(result: &RecommendationResult) {
    println!("{}", result.display_text);
    println!();
    if result.product_ids.is_empty() {
        print_warning("No products were recommended");
    } else {
        println!("🛋️  Recommended products:");
        for (rank, id) in result.product_ids.iter().enumerate() {
            println!("  {}. {id}", rank + 1);
        }
    }
}

pub fn print_run_trace(run: &PipelineRun) {
    let states: Vec<String> = run.history.iter().map(ToString::to_string).collect();
    println!("🧭 Run {} ({})", run.run_id, run.started_at.format("%Y-%m-%d %H:%M:%S"));
    println!("  States: {}", states.join(" -> "));
    if let Some(failure) = &run.failure {
        println!(
            "  Failed at {}: {}",
            failure.stage,
            truncate_str(&failure.reason, 200)
        );
    }
}

pub fn print_config(config: &AppConfig) {
    println!("📋 Shop Assistant Configuration:");
    println!();

    println!("🗄️  Catalog database:");
    println!(
        "  Host: {}:{}",
        config.database.host.as_deref().unwrap_or("N/A"),
        config.database.port
    );
    println!(
        "  Name: {}",
        config.database.name.as_deref().unwrap_or("N/A")
    );
    println!(
        "  Collection: {}",
        config.database.table_name.as_deref().unwrap_or("N/A")
    );
    println!(
        "  Secret: {}",
        config.database.secret_name.as_deref().unwrap_or("N/A")
    );
    println!("  Region: {}", config.aws.region);
    println!();

    println!("🤖 Generation:");
    println!("  Endpoint: {}", config.llm.llm_endpoint);
    println!("  API key: {}", if config.llm.llm_key.is_some() { "***" } else { "N/A" });
    println!("  Vision model: {}", config.llm.vision_model);
    println!("  Text model: {}", config.llm.text_model);
    println!(
        "  Max tokens: {} | Temperature: {}",
        config.llm.max_tokens, config.llm.temperature
    );
    println!();

    println!("🧮 Embeddings:");
    println!(
        "  {} {} ({} dims) at {}",
        config.embeddings.provider,
        config.embeddings.model,
        config.embeddings.dimension,
        config.embeddings.endpoint
    );
    println!();

    println!("🔎 Retrieval: top_k={}", config.retrieval.top_k);
    println!(
        "⏱️  Timeouts: vision={}s retrieval={}s generation={}s request={}s",
        config.timeouts.vision_secs,
        config.timeouts.retrieval_secs,
        config.timeouts.generation_secs,
        config.timeouts.request_deadline_secs
    );
    println!("📝 Logging: {}", config.logging.level);
    println!("🌐 Server: {}:{}", config.server.host, config.server.port);
}

pub fn print_info(msg: &str) {
    println!("ℹ️  {msg}");
}

pub fn print_success(msg: &str) {
    println!("✅ {msg}");
}

pub fn print_warning(msg: &str) {
    println!("⚠️  {msg}");
}

pub fn print_error(msg: &str) {
    eprintln!("❌ {msg}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_str_multibyte() {
        assert_eq!(truncate_str("ñandú rug", 2), "ña...");
        assert_eq!(truncate_str("rug", 10), "rug");
    }

    #[test]
    fn test_print_config_with_missing_database_values() {
        let mut config = AppConfig::default();
        config.llm.llm_key = Some("sk-secret".to_string());
        print_config(&config);

        config.database.host = Some("db.local".to_string());
        config.database.name = Some("shop".to_string());
        config.database.table_name = Some("catalog".to_string());
        print_config(&config);
    }
}
