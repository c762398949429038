//! Participant-facing texts and the renders built from them.

use crate::catalog::{Catalog, Question, Welcome};
use crate::channels::{Button, Render, TextFormat};
use crate::events::Action;
use crate::recommend::Recommendation;

pub const STALE_SESSION: &str = "Your session has expired. Start again with /start";
pub const RESTARTING: &str = "Starting a new search!";
pub const CANCELLED: &str = "Quiz cancelled. To start again, use /start";
pub const NO_MATCHES: &str = "😔 Sorry, we couldn't find anything that matches your answers.\n\n\
Try different preferences or start the search again.";
pub const RESULTS_HEADER: &str = "🎉 Here is what we picked for you:";
pub const RESULTS_FOOTER: &str = "Choose an item to buy or start the search again:";
pub const RESTART_LABEL: &str = "🔄 Start over";

/// Prompt for question `index`: numbered text and one button per option.
pub fn question_prompt(question: &Question, index: usize, total: usize) -> Render {
    Render::text(format!(
        "Question {}/{}:\n{}",
        index + 1,
        total,
        question.text
    ))
    .with_buttons(
        question
            .options
            .iter()
            .enumerate()
            .map(|(choice, option)| Button::callback(option, Action::Answer(choice).to_payload())),
    )
}

/// Results message: the ranked list with purchase buttons, or a no-match
/// notice. Always offers a restart button.
pub fn results(recommendations: &[Recommendation<'_>]) -> Render {
    let render = if recommendations.is_empty() {
        Render::text(NO_MATCHES)
    } else {
        let mut text = format!("{RESULTS_HEADER}\n\n");
        for (rank, rec) in recommendations.iter().enumerate() {
            let item = rec.item;
            text.push_str(&format!(
                "{}. *{}*\n   {}\n   💰 {}\n\n",
                rank + 1,
                item.name,
                item.description,
                item.price
            ));
        }
        text.push_str(RESULTS_FOOTER);

        Render::text(text).with_buttons(recommendations.iter().map(|rec| {
            Button::callback(
                format!("🛒 Buy {}", rec.item.name),
                Action::Purchase(rec.item.name.clone()).to_payload(),
            )
        }))
    };

    render
        .with_button(Button::callback(RESTART_LABEL, Action::Restart.to_payload()))
        .with_format(TextFormat::Markdown)
}

/// A welcome greeting, rendered as HTML without a link preview.
pub fn welcome(welcome: &Welcome) -> Render {
    let render = Render::text(&welcome.text)
        .with_format(TextFormat::Html)
        .without_link_preview();
    match &welcome.link {
        Some(link) => render.with_button(Button::url(&link.label, &link.url)),
        None => render,
    }
}

/// Short acknowledgement after an answer.
pub fn selected(option: &str) -> String {
    format!("Selected: {option}")
}

/// Alert shown when a purchase button is pressed.
pub fn purchase_thanks(item_name: &str) -> String {
    format!("Thanks for your interest in {item_name}! Our shop is coming soon!")
}

/// Comma-separated result names for logs.
pub fn result_names(recommendations: &[Recommendation<'_>]) -> String {
    recommendations
        .iter()
        .map(|r| r.item.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Question prompt for the catalog's question `index`, if it exists.
pub fn prompt_for(catalog: &Catalog, index: usize) -> Option<Render> {
    catalog
        .question(index)
        .map(|q| question_prompt(q, index, catalog.total_questions()))
}
