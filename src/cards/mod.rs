//! Member card rendering.
//!
//! A card is laid out as a list of blocks ([`layout`]), drawn to PDF
//! ([`pdf`]) with the fonts loaded at startup ([`fonts`]). Batches are
//! bundled into a ZIP archive ([`archive`]).

pub mod archive;
pub mod fonts;
pub mod layout;
pub mod pdf;

use chrono::NaiveDate;

use crate::config::Config;
use crate::db::Repository;
use crate::errors::AppError;
use crate::models::Member;

pub use archive::render_archive;
pub use fonts::CardFonts;
pub use layout::build_card;

/// Renders member cards with the configured lodge name and fonts.
#[derive(Debug, Clone)]
pub struct CardRenderer {
    fonts: CardFonts,
    lodge_name: String,
}

/// A rendered card and its download name.
#[derive(Debug, Clone)]
pub struct RenderedCard {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl CardRenderer {
    pub fn new(fonts: CardFonts, lodge_name: impl Into<String>) -> Self {
        Self {
            fonts,
            lodge_name: lodge_name.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(CardFonts::load(&config.font_dir), config.lodge_name.clone())
    }

    /// Render one member's card to PDF bytes.
    pub fn render(&self, member: &Member, issue_date: NaiveDate) -> Result<Vec<u8>, AppError> {
        let layout = build_card(member, &self.lodge_name, issue_date);
        let title = format!("Καρτέλα μέλους {}", member.member_id);
        let document_id = format!("member-{}", member.member_id);
        pdf::render_layout(&layout, &self.fonts, &title, &document_id, issue_date)
    }
}

/// Render the card for member `id`. `None` means no such member.
pub async fn render_card(
    repo: &Repository,
    renderer: &CardRenderer,
    id: i64,
    issue_date: NaiveDate,
) -> Result<Option<RenderedCard>, AppError> {
    let Some(member) = repo.get_member(id).await? else {
        return Ok(None);
    };

    let bytes = renderer.render(&member, issue_date)?;
    Ok(Some(RenderedCard {
        file_name: card_file_name(&member),
        bytes,
    }))
}

/// `Kartela_<last>_<first>.pdf`, with path separators removed.
pub fn card_file_name(member: &Member) -> String {
    let part = |value: Option<&String>| -> String {
        value
            .map(|v| v.trim())
            .unwrap_or_default()
            .chars()
            .filter(|c| !matches!(c, '/' | '\\'))
            .collect()
    };

    let last = part(member.last_name.as_ref());
    let first = part(member.first_name.as_ref());

    if last.is_empty() && first.is_empty() {
        format!("Kartela_{}.pdf", member.member_id)
    } else {
        format!("Kartela_{}_{}.pdf", last, first)
    }
}
