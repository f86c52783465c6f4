//! Card locator export utility.
//!
//! Writes the NFC payload of published cards to files, ready for an NFC
//! writer app or tag programmer, and optionally the QR code as PNG.
//!
//! # Output
//!
//! For each card id, in the output directory:
//! - `{id}.ndef` - raw NDEF message with one URI record
//! - `{id}.png` - QR code (with `--qr`)
//!
//! # Usage
//!
//! ```bash
//! # NDEF payload for one card
//! card-export --db ./data/cards.db --origin https://cards.example.com 0f8fad5b-...
//!
//! # Both encodings, checked against a 137-byte NTAG213
//! card-export --qr --nfc-capacity 137 --out ./tags 0f8fad5b-... 7c9e6679-...
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tapcard_core::{CardId, CardService, Locator, SqliteStore};

/// Export NFC and QR payloads for published cards.
#[derive(Parser, Debug)]
#[command(name = "card-export")]
#[command(about = "Write NDEF messages (and QR codes) for published cards")]
#[command(version)]
struct Args {
    /// Path to the card SQLite database
    #[arg(long, short, env = "TAPCARD_DB_PATH", default_value = "./data/cards.db")]
    db: PathBuf,

    /// Origin canonical card URLs are built on
    #[arg(long, env = "TAPCARD_BASE_ORIGIN", default_value = "http://localhost:8000")]
    origin: String,

    /// Reject payloads larger than the tag's user memory (bytes)
    #[arg(long, env = "TAPCARD_NFC_CAPACITY")]
    nfc_capacity: Option<usize>,

    /// Output directory
    #[arg(long, short, default_value = ".")]
    out: PathBuf,

    /// Also write the QR code as PNG
    #[arg(long)]
    qr: bool,

    /// Card identifiers to export
    #[arg(required = true)]
    cards: Vec<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    println!("Card Export");
    println!("===========");
    println!("Database: {}", args.db.display());
    println!("Origin: {}", args.origin);
    println!();

    if !args.db.exists() {
        anyhow::bail!("Database file not found: {}", args.db.display());
    }

    let store = SqliteStore::open(&args.db)
        .with_context(|| format!("Failed to open database: {}", args.db.display()))?;

    let mut locator = Locator::new(args.origin.as_str());
    if let Some(capacity) = args.nfc_capacity {
        locator = locator.with_nfc_capacity(capacity);
    }
    let service = CardService::new(Arc::new(store), locator);

    std::fs::create_dir_all(&args.out)
        .with_context(|| format!("Failed to create output directory: {}", args.out.display()))?;

    let mut failed = 0usize;
    for id in &args.cards {
        let card_id = CardId::from(id.as_str());
        let artifacts = match service.fetch_artifacts(&card_id) {
            Ok(artifacts) => artifacts,
            Err(e) => {
                eprintln!("  {id}: {e}");
                failed += 1;
                continue;
            }
        };

        let ndef_path = args.out.join(format!("{id}.ndef"));
        std::fs::write(&ndef_path, &artifacts.ndef_message)
            .with_context(|| format!("Failed to write {}", ndef_path.display()))?;
        println!(
            "  {id}: {} ({} bytes NDEF)",
            artifacts.canonical_url,
            artifacts.ndef_message.len()
        );

        if args.qr {
            let png_path = args.out.join(format!("{id}.png"));
            std::fs::write(&png_path, &artifacts.qr_png)
                .with_context(|| format!("Failed to write {}", png_path.display()))?;
        }
    }

    println!();
    println!(
        "Exported {} of {} cards",
        args.cards.len() - failed,
        args.cards.len()
    );

    if failed > 0 {
        anyhow::bail!("{failed} card(s) could not be exported");
    }
    Ok(())
}
