//! CSV Reader Examples
//!
//! Demonstrates the reading capabilities:
//! - Reading a file with the default configuration
//! - Quoted values containing separators
//! - Custom multi-character separators
//! - Manual reading with has_next / take_record
//! - Error handling
//!
//! Run with `RUST_LOG=debug` to see the reader's log output.

use sepstream::{CsvError, CsvReader, CsvReaderBuilder, Encoding};
use std::error::Error;
use std::fs;

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    println!("=== CSV Reader Examples ===\n");

    let dir = std::env::temp_dir().join("sepstream-demo");
    fs::create_dir_all(&dir)?;

    // Example 1: Read a file
    println!("1. Reading a file...");
    {
        let path = dir.join("people.csv");
        fs::write(
            &path,
            "name,age,city\nAlice,30,NYC\nBob,25,SF\nCarol,41,\"Portland, OR\"\n",
        )?;

        let mut reader = CsvReaderBuilder::new()
            .record_separator("\n")
            .from_path(&path)?;
        for record in reader.records() {
            let record = record?;
            println!("   {} ({}) lives in {}", &record["name"], &record["age"], &record["city"]);
        }
        println!("   Headers: {:?}", reader.headers().unwrap_or_default());
        println!("   Total records read: {}", reader.record_count());
    }

    // Example 2: Custom separators
    println!("\n2. Reading with '||' fields and '{{EOL}}' records...");
    {
        let data = "id||note{EOL}1||\"spans || both {EOL} separators\"{EOL}2||\"plain\"{EOL}";
        let reader = CsvReaderBuilder::new()
            .field_separator("||")
            .record_separator("{EOL}")
            .chunk_capacity(8)
            .from_reader(data.as_bytes())?;

        for record in reader {
            let record = record?;
            println!("   {:?}", record.iter().collect::<Vec<_>>());
        }
    }

    // Example 3: Manual reading
    println!("\n3. Manual reading (has_next / take_record)...");
    {
        let data: &[u8] = b"pays;capitale\r\nFrance;Paris\r\nPortugal;Lisboa\r\n";
        let mut reader = CsvReaderBuilder::new()
            .encoding(Encoding::Latin1)
            .field_separator(";")
            .record_separator("\r\n")
            .from_reader(data)?;

        let columns = reader.resolve_headers()?;
        println!("   {} column(s)", columns.len());
        while reader.has_next()? {
            let record = reader.take_record()?;
            println!("   {:?}", record.values());
        }
    }

    // Example 4: Error handling
    println!("\n4. Error handling example...");
    {
        match CsvReader::open(dir.join("nonexistent.csv")) {
            Ok(_) => println!("   File opened"),
            Err(e) => println!("   Expected error: {}", e),
        }

        let mut reader = CsvReaderBuilder::new()
            .record_separator("\n")
            .from_reader("a,b,c\n1,2\n".as_bytes())?;
        match reader.read_record() {
            Err(CsvError::MalformedRecord { column, line }) => {
                println!("   Column {:?} not terminated in {:?}", column, line)
            }
            other => println!("   Unexpected: {:?}", other),
        }
    }

    fs::remove_dir_all(&dir)?;
    println!("\n=== All examples completed successfully! ===");

    Ok(())
}
