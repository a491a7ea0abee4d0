use std::env;
use std::fs;
use std::path::PathBuf;

/// Filesystem layout for the pipeline stages and the chat API.
///
/// Every stage reads its input from the previous stage's directory, so the
/// whole layout hangs off a single data root (`MINIRAG_DATA_DIR` override).
#[derive(Debug, Clone)]
pub struct AppPaths {
    pub data_dir: PathBuf,
    pub scraped_raw_dir: PathBuf,
    pub processed_text_dir: PathBuf,
    pub facts_dir: PathBuf,
    pub index_db_path: PathBuf,
    pub log_dir: PathBuf,
}

impl AppPaths {
    pub fn new() -> Self {
        let data_dir = discover_data_dir();
        Self::with_data_dir(data_dir)
    }

    pub fn with_data_dir(data_dir: PathBuf) -> Self {
        let scraped_raw_dir = data_dir.join("scraped_raw");
        let processed_text_dir = data_dir.join("processed_text");
        let facts_dir = data_dir.join("facts");
        let index_db_path = data_dir.join("mini_docs.db");
        let log_dir = data_dir.join("logs");

        for dir in [&data_dir, &scraped_raw_dir, &processed_text_dir, &facts_dir, &log_dir] {
            let _ = fs::create_dir_all(dir);
        }

        AppPaths {
            data_dir,
            scraped_raw_dir,
            processed_text_dir,
            facts_dir,
            index_db_path,
            log_dir,
        }
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}

fn discover_data_dir() -> PathBuf {
    if let Ok(dir) = env::var("MINIRAG_DATA_DIR") {
        return PathBuf::from(dir);
    }

    if cfg!(debug_assertions) {
        let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        return manifest_dir.join("data");
    }

    let xdg = env::var("XDG_DATA_HOME").unwrap_or_else(|_| {
        home_dir().join(".local/share").to_string_lossy().to_string()
    });
    PathBuf::from(xdg).join("minirag")
}

fn home_dir() -> PathBuf {
    env::var("HOME")
        .or_else(|_| env::var("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
}
