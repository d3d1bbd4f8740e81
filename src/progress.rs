//! Progress bar display for downloads

use indicatif::{ProgressBar, ProgressStyle};

/// Create a progress bar for a download of `total` bytes
///
/// Falls back to a spinner when the server does not send a length.
/// indicatif hides the bar on its own when stderr is not a terminal.
pub fn download_progress(total: Option<u64>, name: &str) -> ProgressBar {
    let pb = match total {
        Some(len) => {
            let style = ProgressStyle::default_bar()
                .template("[{bar:40.cyan/blue}] {bytes}/{total_bytes} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-");
            let pb = ProgressBar::new(len);
            pb.set_style(style);
            pb
        }
        None => {
            let style = ProgressStyle::default_spinner()
                .template("{spinner:.green} {bytes} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner());
            let pb = ProgressBar::new_spinner();
            pb.set_style(style);
            pb
        }
    };
    pb.set_message(name.to_string());
    pb
}
