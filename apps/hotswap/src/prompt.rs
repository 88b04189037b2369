use async_trait::async_trait;
use hotswap_sync::UpdatePrompt;
use hotswap_types::RemotePackage;
use std::io::{BufRead, Write};

/// Asks on the terminal before an update is downloaded
pub struct TerminalPrompt;

#[async_trait]
impl UpdatePrompt for TerminalPrompt {
    async fn confirm(&self, package: &RemotePackage) -> bool {
        let question = if package.is_mandatory {
            format!(
                "Mandatory update {} ({} bytes) will be installed. Press enter to continue.",
                package.label, package.package_size
            )
        } else {
            format!(
                "Install update {} ({} bytes)? [y/N]",
                package.label, package.package_size
            )
        };
        let answer = tokio::task::spawn_blocking(move || {
            let mut stdout = std::io::stdout();
            let _ = writeln!(stdout, "{question}");
            let _ = stdout.flush();
            let mut line = String::new();
            std::io::stdin().lock().read_line(&mut line).map(|_| line)
        })
        .await;

        match answer {
            Ok(Ok(line)) => matches!(line.trim(), "y" | "Y" | "yes"),
            _ => false,
        }
    }
}
