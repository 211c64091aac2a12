use log::{debug, error};
use tokio::io::{self, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use recipe_browser::view::{parse_control, HELP};
use recipe_browser::{
    BrowserConfig, BrowserError, Control, RecipeClient, RecipeSession, TerminalView,
    ViewController,
};

#[tokio::main]
async fn main() -> Result<(), BrowserError> {
    env_logger::init();

    let config = BrowserConfig::load()?;
    debug!("{:#?}", config);

    let client = RecipeClient::new(&config)?;
    let session = RecipeSession::new(client, &config);
    let mut controller = ViewController::new(session, TerminalView::stdout(), config.min_loading());

    let (controls, mut inputs) = mpsc::channel(16);
    let reader = tokio::spawn(read_controls(controls));

    // Initial load goes through the same guard as a user refresh
    controller.refresh_rejecting(&mut inputs).await;
    println!("{}", HELP);
    controller.run(&mut inputs).await;

    match reader.await {
        Ok(result) => result?,
        Err(e) => error!("Input reader stopped: {}", e),
    }
    Ok(())
}

/// Forward stdin commands as controls until `q` or end of input
async fn read_controls(controls: mpsc::Sender<Control>) -> io::Result<()> {
    let mut lines = BufReader::new(io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line == "q" || line == "quit" {
            break;
        }
        if line.is_empty() {
            continue;
        }
        match parse_control(line) {
            Some(control) => {
                if controls.send(control).await.is_err() {
                    break;
                }
            }
            None => {
                error!("Unknown command: {}", line);
                println!("{}", HELP);
            }
        }
    }
    Ok(())
}
