//! CLI front end — stdin/stdout REPL over a conversation.
//!
//! Prompts are rendered as numbered lists; the user answers with a number,
//! an option value, or free text when the bot is waiting for a description.

use tokio::io::{AsyncBufReadExt, BufReader};

use crate::conversation::Conversation;
use crate::error::ChannelError;
use crate::transcript::{Choice, Message};

/// What a line of input means against the current prompt.
#[derive(Debug, PartialEq, Eq)]
enum Input {
    Option(String),
    Text(String),
    Quit,
    Invalid,
}

/// Map one trimmed input line to an action. Numbers are 1-based indices
/// into the latest prompt; bare values are accepted too so transcripts
/// can be replayed by hand.
fn resolve_input(line: &str, prompt: Option<&[Choice]>, accepts_text: bool) -> Input {
    if line.eq_ignore_ascii_case("quit") || line.eq_ignore_ascii_case("exit") {
        return Input::Quit;
    }
    if let Some(choices) = prompt {
        if let Ok(n) = line.parse::<usize>() {
            if n >= 1 && n <= choices.len() {
                return Input::Option(choices[n - 1].value.clone());
            }
        }
        if let Some(choice) = choices.iter().find(|c| c.value.eq_ignore_ascii_case(line)) {
            return Input::Option(choice.value.clone());
        }
    }
    if accepts_text {
        return Input::Text(line.to_string());
    }
    Input::Invalid
}

fn render_message(message: &Message) {
    if message.is_bot() {
        println!("\n{}", message.text);
        for (i, choice) in message.choices.iter().enumerate() {
            println!("  [{}] {}", i + 1, choice.label);
        }
    } else {
        println!("  ↳ {}", message.text);
    }
}

/// Print every transcript message past the watermark and advance it.
fn render_new(conversation: &Conversation, rendered: &mut usize) {
    let messages = conversation.transcript().messages();
    for message in &messages[*rendered..] {
        render_message(message);
    }
    *rendered = messages.len();
}

/// Run the conversation against stdin until the user quits or the flow
/// ends without offering further options.
pub async fn run(mut conversation: Conversation) -> Result<(), ChannelError> {
    let mut rendered = 0;

    conversation.start().await;
    render_new(&conversation, &mut rendered);

    let stdin = tokio::io::stdin();
    let reader = BufReader::new(stdin);
    let mut lines = reader.lines();

    loop {
        // Nothing left to answer: the flow has said its goodbyes.
        if conversation.step().is_terminal()
            && conversation.transcript().last_options_prompt().is_none()
        {
            break;
        }

        eprint!("> ");
        let line = match lines.next_line().await {
            Ok(Some(line)) => line.trim().to_string(),
            Ok(None) => break, // EOF
            Err(e) => return Err(ChannelError::Io(e)),
        };
        if line.is_empty() {
            continue;
        }

        let prompt = conversation.transcript().last_options_prompt();
        match resolve_input(&line, prompt, conversation.accepts_text()) {
            Input::Option(value) => conversation.select_option(&value).await,
            Input::Text(text) => conversation.submit_text(&text).await,
            Input::Quit => break,
            Input::Invalid => {
                eprintln!("Please pick one of the numbered options.");
                continue;
            }
        }
        render_new(&conversation, &mut rendered);
    }

    Ok(())
}
