use std::path::PathBuf;

use tracing::{debug, warn};

/// Loads `ZKV_*` settings from a `.env` file in the working directory or one
/// of its parents. Returns the file that was loaded.
///
/// IO errors are taken to mean there is no file. A file that does not parse
/// is logged and skipped.
pub fn load_dotenv() -> Option<PathBuf> {
    loaded(dotenvy::dotenv())
}

fn loaded(result: Result<PathBuf, dotenvy::Error>) -> Option<PathBuf> {
    match result {
        Ok(path) => {
            debug!(path = %path.display(), "loaded environment file");
            Some(path)
        }
        Err(dotenvy::Error::Io(_)) => None,
        Err(e) => {
            warn!("Found a local `.env` file but could not parse it (err: {e})");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::*;

    #[test]
    fn only_a_loaded_file_is_reported() {
        let path = PathBuf::from("/srv/zkv/.env");
        assert_eq!(loaded(Ok(path.clone())), Some(path));

        for kind in [io::ErrorKind::NotFound, io::ErrorKind::PermissionDenied] {
            let err = dotenvy::Error::Io(io::Error::new(kind, "unreadable"));
            assert_eq!(loaded(Err(err)), None);
        }
        assert_eq!(
            loaded(Err(dotenvy::Error::LineParse("ZKV_DOMAIN_ID 3".to_owned(), 13))),
            None
        );
    }
}
