use lemma_client::{Lemmatizer, LemmatizerConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    env_logger::init();

    let text = "Gallia est omnis divisa in partes tres, quarum unam incolunt Belgae";

    // Example 1: Sequential lookups
    println!("=== One request at a time ===");
    let sequential = Lemmatizer::new(LemmatizerConfig::new(1, 100)?)?;
    let start = std::time::Instant::now();
    let lemmas = sequential.lemmatize_text(text).collect_lemmas().await?;
    println!("Took {:?}: {}", start.elapsed(), lemmas.join(" "));

    // Example 2: Concurrent lookups, same output order
    println!("\n=== Ten requests at a time ===");
    let concurrent = Lemmatizer::new(LemmatizerConfig::new(10, 100)?)?;
    let start = std::time::Instant::now();
    let lemmas = concurrent.lemmatize_text(text).collect_lemmas().await?;
    println!("Took {:?}: {}", start.elapsed(), lemmas.join(" "));

    // Example 3: The second pass is served from the cache
    println!("\n=== Cached ===");
    let start = std::time::Instant::now();
    let mut reader = concurrent.lemmatize_text(text);
    while let Some(lemma) = reader.next().await {
        print!("{} ", lemma?);
    }
    println!("\nTook {:?}", start.elapsed());
    println!("Cache stats: {:?}", concurrent.cache_stats());

    Ok(())
}
