//! `monobox` is the command line client of the monoboxd management API.
//!
//! ## Usage
//!
//! ```bash
//! monobox create web --image /srv/rootfs/alpine -- /bin/sleep 300
//! monobox start 0fd8017657e94a429266441ee2f5a2a4
//! monobox stop 0fd8017657e94a429266441ee2f5a2a4 --timeout-ms 2000
//! monobox status 0fd8017657e94a429266441ee2f5a2a4
//! monobox remove 0fd8017657e94a429266441ee2f5a2a4
//! ```

use clap::{CommandFactory, Parser};
use monobox::{
    cli::{MonoboxArgs, MonoboxSubcommand},
    MonoboxError, MonoboxResult,
};
use reqwest::{Client, Response};
use serde_json::{json, Value};

//--------------------------------------------------------------------------------------------------
// Functions: main
//--------------------------------------------------------------------------------------------------

#[tokio::main]
async fn main() -> MonoboxResult<()> {
    // Parse command line arguments
    let args = MonoboxArgs::parse();
    let host = args.host.trim_end_matches('/').to_string();
    let client = Client::new();

    match args.subcommand {
        Some(MonoboxSubcommand::Create {
            name,
            image,
            rootfs_readonly,
            stdin,
            leave_stdin_open,
            command,
        }) => {
            let mut parts = command.into_iter();
            let program = parts.next().unwrap_or_default();
            let body = json!({
                "name": name,
                "command": program,
                "args": parts.collect::<Vec<String>>(),
                "rootfs_path": image.display().to_string(),
                "rootfs_readonly": rootfs_readonly,
                "stdin": stdin,
                "stdin_once": stdin && !leave_stdin_open,
            });

            let response = client
                .post(format!("{}/containers", host))
                .json(&body)
                .send()
                .await?;
            print_response(response).await?;
        }
        Some(MonoboxSubcommand::Start { id }) => {
            let response = client
                .post(format!("{}/containers/{}/start", host, id))
                .send()
                .await?;
            print_response(response).await?;
        }
        Some(MonoboxSubcommand::Stop { id, timeout_ms }) => {
            let response = client
                .post(format!("{}/containers/{}/stop", host, id))
                .json(&json!({ "timeout_ms": timeout_ms }))
                .send()
                .await?;
            print_response(response).await?;
        }
        Some(MonoboxSubcommand::Remove { id }) => {
            let response = client
                .delete(format!("{}/containers/{}", host, id))
                .send()
                .await?;
            print_response(response).await?;
        }
        Some(MonoboxSubcommand::List) => {
            let response = client.get(format!("{}/containers", host)).send().await?;
            print_response(response).await?;
        }
        Some(MonoboxSubcommand::Status { id }) => {
            let response = client
                .get(format!("{}/containers/{}", host, id))
                .send()
                .await?;
            print_response(response).await?;
        }
        None => {
            MonoboxArgs::command().print_help()?;
        }
    }

    Ok(())
}

//--------------------------------------------------------------------------------------------------
// Functions: *
//--------------------------------------------------------------------------------------------------

/// Prints the response body and turns non-success statuses into errors.
async fn print_response(response: Response) -> MonoboxResult<()> {
    let status = response.status();
    let body: Value = response.json().await?;
    println!("{}", serde_json::to_string_pretty(&body)?);

    if !status.is_success() {
        let message = body
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or("request failed")
            .to_string();
        return Err(MonoboxError::custom(anyhow::anyhow!(
            "{} (status {})",
            message,
            status
        )));
    }

    Ok(())
}
