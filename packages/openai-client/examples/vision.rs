//! Vision chat completion example

use openai_client::{ChatRequest, Message, OpenAIClient};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let client = OpenAIClient::from_env()?;

    let image_url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "https://upload.wikimedia.org/wikipedia/commons/3/3f/Deck_construction.jpg".to_string());

    let response = client
        .chat_completion(
            ChatRequest::new("gpt-4o")
                .message(Message::system("You describe construction photos in one sentence."))
                .message(Message::user_with_image("What work is shown here?", image_url))
                .temperature(0.4)
                .token_limit(120),
        )
        .await?;

    println!("Response: {}", response.content);
    if let Some(usage) = response.usage {
        println!("Tokens used: {}", usage.total_tokens);
    }

    Ok(())
}
