pub mod commands;

use std::sync::Arc;

use crate::ai::models::GenerateRequest;
use crate::ai::{ArticleGenerator, BackendFactory, PromptSessionCache};
use crate::cli::commands::Commands;
use crate::config::AppConfig;

pub async fn run_cli(command: Commands, config_path: String) {
    let config = AppConfig::load(&config_path).expect("Failed to load config");

    let backend = BackendFactory::create_default(&config)
        .expect("Failed to initialize AI backend from config");
    let cache = Arc::new(PromptSessionCache::default());
    let generator = ArticleGenerator::new(backend, config.ai.models.clone(), cache);

    match command {
        Commands::Serve => {
            panic!("Serve command should be intercepted by main.rs to boot actix-web");
        }
        Commands::Analyze { prompt } => match generator.analyze(&prompt).await {
            Ok(analysis) => {
                println!("Topic:    {}", analysis.topic);
                println!("Keywords: {}", analysis.keywords.join(", "));
                println!(
                    "Length hint in prompt: {} | Tone hint in prompt: {}",
                    analysis.has_article_length_in_prompt, analysis.has_tone_in_prompt
                );
            }
            Err(e) => eprintln!("Error: {}", e),
        },
        Commands::Generate {
            prompt,
            length,
            tone,
            keywords,
        } => {
            let request = GenerateRequest {
                session_id: None,
                user_input: Some(prompt),
                selected_keywords: if keywords.is_empty() {
                    None
                } else {
                    Some(keywords)
                },
                article_length: length,
                tone,
            };

            match generator.generate(&request).await {
                Ok(article) => {
                    println!("# {}\n", article.title);
                    println!("{}\n", article.content);
                    println!("({} words)", article.word_count);
                }
                Err(e) => eprintln!("Error: {}", e),
            }
        }
    }
}
