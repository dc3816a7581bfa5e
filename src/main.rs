mod config;
mod extract;

use std::sync::Arc;

use dotenv::dotenv;
use log::{info, warn};
use quizbot::quiz::{QuizEngine, QuizSession};
use rand::{rngs::StdRng, SeedableRng};
use teloxide::{
    dispatching::dialogue::{serializer::Json, ErasedStorage, SqliteStorage, Storage},
    net::Download,
    prelude::*,
    types::{CallbackQuery, ChatId, InlineKeyboardButton, InlineKeyboardMarkup, MessageId},
};

use config::BotConfig;
use extract::DocumentFormat;

type QuizDialogue = Dialogue<State, ErasedStorage<State>>;
type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum State {
    #[default]
    Start,
    ReceiveDocument,
    ReceiveAmountOfQuestions {
        text: String,
    },
    Quiz {
        session: QuizSession,
    },
}

type DialogueStorage = Arc<ErasedStorage<State>>;

#[tokio::main]
async fn main() -> HandlerResult {
    dotenv().ok();

    pretty_env_logger::init();
    log::info!("Starting quiz bot...");

    let config = Arc::new(BotConfig::from_env()?);
    let engine = Arc::new(QuizEngine::new(config.quiz_config()));

    let bot = Bot::from_env();

    info!("Opening dialogue storage at {}", config.db_path);
    let storage: DialogueStorage = SqliteStorage::open(&config.db_path, Json).await?.erase();

    let handler = dptree::entry()
        .branch(
            Update::filter_message()
                .enter_dialogue::<Message, ErasedStorage<State>, State>()
                .branch(dptree::case![State::Start].endpoint(start))
                .branch(dptree::case![State::ReceiveDocument].endpoint(receive_document))
                .branch(
                    dptree::case![State::ReceiveAmountOfQuestions { text }]
                        .endpoint(receive_amount_of_questions),
                )
                .branch(
                    dptree::case![State::Quiz { session }].endpoint(receive_message_during_quiz),
                ),
        )
        .branch(
            Update::filter_callback_query()
                .enter_dialogue::<CallbackQuery, ErasedStorage<State>, State>()
                .branch(dptree::case![State::Quiz { session }].endpoint(receive_answer))
                .branch(dptree::endpoint(answer_stale_button)),
        );

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![storage, config, engine])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
    Ok(())
}

const GREETING_TEXT: &str =
    "Hello! Send me a PDF or text document, and I will generate an interactive quiz for you.";
async fn start(
    bot: Bot,
    dialogue: QuizDialogue,
    msg: Message,
    config: Arc<BotConfig>,
) -> HandlerResult {
    // Someone may skip /start and send the document straight away
    if msg.document().is_some() {
        return receive_document(bot, dialogue, msg, config).await;
    }

    bot.send_message(msg.chat.id, GREETING_TEXT).await?;

    dialogue.update(State::ReceiveDocument).await?;
    Ok(())
}

const UNSUPPORTED_DOCUMENT_TEXT: &str =
    "Please send a PDF or a plain text document (.pdf, .txt or .md).";
const UNREADABLE_DOCUMENT_TEXT: &str = "The document appears to be empty or unreadable.";
async fn receive_document(
    bot: Bot,
    dialogue: QuizDialogue,
    msg: Message,
    config: Arc<BotConfig>,
) -> HandlerResult {
    let Some(document) = msg.document() else {
        bot.send_message(msg.chat.id, GREETING_TEXT).await?;
        return Ok(());
    };

    let file_name = document.file_name.clone();
    let mime_type = document
        .mime_type
        .as_ref()
        .map(|m| m.essence_str().to_string());
    if DocumentFormat::detect(file_name.as_deref(), mime_type.as_deref()).is_none() {
        warn!("Rejected document {:?} ({:?})", file_name, mime_type);
        bot.send_message(msg.chat.id, UNSUPPORTED_DOCUMENT_TEXT)
            .await?;
        return Ok(());
    }
    if document.file.size > config.max_document_bytes {
        bot.send_message(
            msg.chat.id,
            format!(
                "The document is too large. Please send a file smaller than {} KB.",
                config.max_document_bytes / 1024
            ),
        )
        .await?;
        return Ok(());
    }

    bot.send_message(msg.chat.id, "Processing your document... Please wait.")
        .await?;

    let file = bot.get_file(&document.file.id).await?;
    let mut bytes: Vec<u8> = Vec::new();
    bot.download_file(&file.path, &mut bytes).await?;

    // PDF parsing is CPU heavy and may panic on malformed files, so keep it off the async workers
    let extracted = tokio::task::spawn_blocking(move || {
        extract::extract_text(file_name.as_deref(), mime_type.as_deref(), &bytes)
    })
    .await;
    let text = match extracted {
        Ok(Ok(text)) => text,
        Ok(Err(err)) => {
            warn!("Could not extract text: {}", err);
            bot.send_message(msg.chat.id, UNREADABLE_DOCUMENT_TEXT)
                .await?;
            return Ok(());
        }
        Err(err) => {
            warn!("Text extraction crashed: {}", err);
            bot.send_message(msg.chat.id, UNREADABLE_DOCUMENT_TEXT)
                .await?;
            return Ok(());
        }
    };

    if text.trim().is_empty() {
        bot.send_message(msg.chat.id, UNREADABLE_DOCUMENT_TEXT)
            .await?;
        return Ok(());
    }

    info!("Received {} bytes of text in chat {}", text.len(), msg.chat.id);
    bot.send_message(
        msg.chat.id,
        "How many questions would you like to generate? (1-5 recommended)",
    )
    .await?;

    dialogue
        .update(State::ReceiveAmountOfQuestions { text })
        .await?;
    Ok(())
}

async fn receive_amount_of_questions(
    bot: Bot,
    dialogue: QuizDialogue,
    msg: Message,
    text: String,
    config: Arc<BotConfig>,
    engine: Arc<QuizEngine>,
) -> HandlerResult {
    match classify_message(msg.document().is_some(), msg.text()) {
        // A new document replaces the one we were about to quiz on
        MessageKind::Document => return receive_document(bot, dialogue, msg, config).await,
        MessageKind::Restart => {
            bot.send_message(msg.chat.id, GREETING_TEXT).await?;
            dialogue.update(State::ReceiveDocument).await?;
            return Ok(());
        }
        MessageKind::Other => {}
    }

    let max_questions = engine.clamp_count(usize::MAX);
    let Some(amount) = msg.text().and_then(|t| t.trim().parse::<i64>().ok()) else {
        bot.send_message(
            msg.chat.id,
            format!("Please send a valid number between 1 and {}.", max_questions),
        )
        .await?;
        return Ok(());
    };
    if amount <= 0 {
        bot.send_message(msg.chat.id, "Please enter a positive number.")
            .await?;
        return Ok(());
    }

    let mut amount = usize::try_from(amount).unwrap_or(usize::MAX);
    if amount > max_questions {
        bot.send_message(
            msg.chat.id,
            format!(
                "Maximum {0} questions allowed. Generating {0} questions...",
                max_questions
            ),
        )
        .await?;
        amount = max_questions;
    }

    let generation = {
        let engine = engine.clone();
        tokio::task::spawn_blocking(move || {
            let mut rng = StdRng::from_entropy();
            engine.generate_quiz(&text, amount, &mut rng)
        })
        .await?
    };
    if generation.is_fallback() {
        warn!("Falling back to the generic question in chat {}", msg.chat.id);
        bot.send_message(
            msg.chat.id,
            "I could not build a good quiz from this content, so here is a general question instead.",
        )
        .await?;
    }

    let session = QuizSession::new().start(generation.into_questions())?;
    info!(
        "Starting a quiz of {} questions in chat {}",
        session.total_questions(),
        msg.chat.id
    );
    send_question(&bot, msg.chat.id, &session, None).await?;

    dialogue.update(State::Quiz { session }).await?;
    Ok(())
}

async fn receive_message_during_quiz(
    bot: Bot,
    dialogue: QuizDialogue,
    msg: Message,
    session: QuizSession,
    config: Arc<BotConfig>,
) -> HandlerResult {
    match classify_message(msg.document().is_some(), msg.text()) {
        MessageKind::Document => {
            info!("New document replaces the running quiz in chat {}", msg.chat.id);
            receive_document(bot, dialogue, msg, config).await
        }
        MessageKind::Restart => {
            let (state, summary) = abandon_quiz(&session);
            info!("Quiz abandoned in chat {}", msg.chat.id);
            bot.send_message(msg.chat.id, summary).await?;
            dialogue.update(state).await?;
            Ok(())
        }
        MessageKind::Other => {
            bot.send_message(
                msg.chat.id,
                "Please answer using the buttons under the question, or send /cancel to stop the quiz.",
            )
            .await?;
            Ok(())
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MessageKind {
    Document,
    Restart,
    Other,
}

fn classify_message(has_document: bool, text: Option<&str>) -> MessageKind {
    if has_document {
        return MessageKind::Document;
    }
    // Commands may look like "/cancel@SomeBot" in group chats
    let command = text
        .and_then(|t| t.split_whitespace().next())
        .and_then(|word| word.split('@').next());
    match command {
        Some("/start") | Some("/cancel") => MessageKind::Restart,
        _ => MessageKind::Other,
    }
}

/// Drops a running quiz and tells the user how far they got.
fn abandon_quiz(session: &QuizSession) -> (State, String) {
    let answered = session
        .question_number()
        .map(|n| n - 1)
        .unwrap_or(session.total_questions());
    let summary = format!(
        "Quiz stopped after {} of {} questions. Score: {}/{}\n\n{}",
        answered,
        session.total_questions(),
        session.score(),
        answered,
        GREETING_TEXT
    );
    (State::ReceiveDocument, summary)
}

async fn receive_answer(
    bot: Bot,
    dialogue: QuizDialogue,
    q: CallbackQuery,
    session: QuizSession,
) -> HandlerResult {
    bot.answer_callback_query(q.id.clone()).await?;

    let Some(message) = q.message else {
        return Ok(());
    };
    let Some((question_number, selected)) = q.data.as_deref().and_then(parse_answer_data) else {
        warn!("Malformed answer data {:?}", q.data);
        return Ok(());
    };
    // Buttons of a question that was already answered
    if session.question_number() != Some(question_number) {
        return Ok(());
    }

    let (session, outcome) = session.submit_answer(selected)?;

    let feedback = if outcome.was_correct {
        "✅ Correct!".to_string()
    } else {
        format!(
            "❌ Wrong! The correct answer was: {}",
            outcome.correct_option
        )
    };
    bot.send_message(message.chat.id, feedback).await?;

    if outcome.is_complete {
        let final_score = format!(
            "Quiz completed!\nFinal score: {}/{}\n\nSend me another document for a new quiz.",
            outcome.score, outcome.total_questions
        );
        bot.send_message(message.chat.id, final_score).await?;
        info!(
            "Quiz in chat {} finished with {}/{}",
            message.chat.id, outcome.score, outcome.total_questions
        );

        dialogue.update(State::ReceiveDocument).await?;
        return Ok(());
    }

    send_question(&bot, message.chat.id, &session, Some(message.id)).await?;

    dialogue.update(State::Quiz { session }).await?;
    Ok(())
}

async fn answer_stale_button(bot: Bot, q: CallbackQuery) -> HandlerResult {
    bot.answer_callback_query(q.id)
        .text("This quiz is over. Send me a document to start a new one.")
        .await?;
    Ok(())
}

/// Sends the current question, or replaces the previous one in `edit` with it.
async fn send_question(
    bot: &Bot,
    chat_id: ChatId,
    session: &QuizSession,
    edit: Option<MessageId>,
) -> HandlerResult {
    let question = session.current_question()?;
    let number = session.question_number().unwrap_or(1);

    let question_text = format!(
        "Question {}:\n\n{}\n\nYour score: {}/{}",
        number,
        question.text,
        session.score(),
        number - 1
    );

    let keyboard = InlineKeyboardMarkup::new(question.options.iter().enumerate().map(
        |(idx, option)| {
            vec![InlineKeyboardButton::callback(
                format!("{}) {}", option_label(idx), option),
                answer_data(number, idx),
            )]
        },
    ));

    match edit {
        Some(message_id) => {
            bot.edit_message_text(chat_id, message_id, question_text)
                .reply_markup(keyboard)
                .await?
        }
        None => {
            bot.send_message(chat_id, question_text)
                .reply_markup(keyboard)
                .await?
        }
    };
    Ok(())
}

fn option_label(idx: usize) -> char {
    (b'A'..=b'Z')
        .nth(idx)
        .map(char::from)
        .unwrap_or('?')
}

// Callback data carries the question number so a late press on an old keyboard is ignored
fn answer_data(question_number: usize, option: usize) -> String {
    format!("{}:{}", question_number, option)
}

fn parse_answer_data(data: &str) -> Option<(usize, usize)> {
    let (question_number, option) = data.split_once(':')?;
    Some((question_number.parse().ok()?, option.parse().ok()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use quizbot::quiz::Question;

    #[test]
    fn answer_data_round_trips() {
        assert_eq!(parse_answer_data(&answer_data(3, 1)), Some((3, 1)));
        assert_eq!(parse_answer_data("2"), None);
        assert_eq!(parse_answer_data("x:1"), None);
    }

    #[test]
    fn documents_and_commands_are_told_apart() {
        assert_eq!(classify_message(true, None), MessageKind::Document);
        assert_eq!(classify_message(true, Some("/cancel")), MessageKind::Document);
        assert_eq!(classify_message(false, Some("/cancel")), MessageKind::Restart);
        assert_eq!(classify_message(false, Some("/start@QuizBot now")), MessageKind::Restart);
        assert_eq!(classify_message(false, Some("3")), MessageKind::Other);
        assert_eq!(classify_message(false, Some("cancel")), MessageKind::Other);
        assert_eq!(classify_message(false, None), MessageKind::Other);
    }

    #[test]
    fn abandoning_a_quiz_waits_for_a_new_document() {
        let question = Question::new(
            "Lava cools into _____ rock.".to_string(),
            ["igneous", "igneouss", "rocks", "cooled"]
                .iter()
                .map(|o| o.to_string())
                .collect(),
            0,
        );
        let session = QuizSession::new().start(vec![question; 3]).unwrap();
        let (session, _) = session.submit_answer(0).unwrap();

        let (state, summary) = abandon_quiz(&session);
        assert_eq!(state, State::ReceiveDocument);
        assert!(summary.starts_with("Quiz stopped after 1 of 3 questions. Score: 1/1"));
    }

    #[test]
    fn options_are_labelled_alphabetically() {
        assert_eq!(option_label(0), 'A');
        assert_eq!(option_label(3), 'D');
    }
}
