use std::fmt::{Debug, Display};

use study_vault::core::{get_subscriber, init_subscriber, AppConfig};
use study_vault::study_vault_web_server::StudyVaultWebServer;
use tokio::task::JoinError;

use colored::*;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let file_appender = tracing_appender::rolling::daily("/var/tmp/log/study_vault", "app");

    let subscriber = get_subscriber("study_vault".into(), "info".into(), file_appender);
    init_subscriber(subscriber);

    let config = AppConfig::new().expect("cant build our appConfig object");

    let study_vault_web_server = StudyVaultWebServer::build(config.clone())
        .await
        .expect("failed to build the web server");

    let server_task = tokio::spawn(study_vault_web_server.run_until_stopped());

    println!("{}", "-----------------------------------------".green());
    println!(
        "🚀 Server started on Addr: {}:{}",
        config.study_vault_server_config.host, config.study_vault_server_config.port
    );
    println!("{}", "-----------------------------------------".green());

    tokio::select! {
        o = server_task => {report_exit("study_vault web server", o);}
    }
    Ok(())
}

fn report_exit(task_name: &str, outcome: Result<Result<(), impl Debug + Display>, JoinError>) {
    match outcome {
        Ok(Ok(())) => {
            tracing::info!("{} has exited", task_name)
        }
        Ok(Err(e)) => {
            tracing::error!(
                error.cause_chain = ?e,
                error.message = %e,
                "{} failed",
                task_name
            )
        }
        Err(e) => {
            tracing::error!(
                error.cause_chain = ?e,
                error.message = %e,
                "{}' task failed to complete",
                task_name
            )
        }
    }
}
