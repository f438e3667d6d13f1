use directories::ProjectDirs;
use std::path::PathBuf;

/// Where drillpace keeps its run log and diagnostics.
pub struct AppDirs;

impl AppDirs {
    pub fn state_dir() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            Some(
                PathBuf::from(home)
                    .join(".local")
                    .join("state")
                    .join("drillpace"),
            )
        } else {
            ProjectDirs::from("", "", "drillpace").map(|dirs| dirs.data_local_dir().to_path_buf())
        }
    }

    pub fn history_path() -> Option<PathBuf> {
        Self::state_dir().map(|dir| dir.join("runs.csv"))
    }

    pub fn log_path() -> Option<PathBuf> {
        Self::state_dir().map(|dir| dir.join("drillpace.log"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn files_share_the_state_dir() {
        let (Some(history), Some(log)) = (AppDirs::history_path(), AppDirs::log_path()) else {
            return;
        };
        assert_eq!(history.parent(), log.parent());
        assert!(history.ends_with("drillpace/runs.csv"));
    }
}
