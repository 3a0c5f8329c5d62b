//! Advisory theme suggestion based on the mix of slide kinds.

use crate::theme::TemplateChoice;
use crate::types::{SlideKind, SlideRecord};

/// Suggest a built-in template for a deck.
///
/// Chart-heavy decks get Business, text-heavy decks get Minimal, and ties
/// (including an empty deck) get Creative. Bullet slides count toward
/// neither side. The result is never applied automatically.
pub fn suggest(slides: &[SlideRecord]) -> TemplateChoice {
    let (text_count, chart_count) =
        slides
            .iter()
            .fold((0usize, 0usize), |(text, chart), slide| match slide.kind() {
                SlideKind::Text => (text + 1, chart),
                SlideKind::Chart => (text, chart + 1),
                SlideKind::Bullet => (text, chart),
            });

    if chart_count > text_count {
        TemplateChoice::Business
    } else if text_count > chart_count {
        TemplateChoice::Minimal
    } else {
        TemplateChoice::Creative
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SlideListStore;
    use crate::types::NewSlide;

    fn deck(kinds: &[SlideKind]) -> SlideListStore {
        let mut store = SlideListStore::new();
        for (i, kind) in kinds.iter().enumerate() {
            let title = format!("Slide {}", i + 1);
            let slide = match kind {
                SlideKind::Text => NewSlide::text(title, "body"),
                SlideKind::Bullet => NewSlide::bullet(title, "a\nb"),
                SlideKind::Chart => NewSlide::chart(title, None, ""),
            };
            store.append(slide);
        }
        store
    }

    #[test]
    fn test_empty_deck_is_creative() {
        assert_eq!(suggest(&[]), TemplateChoice::Creative);
    }

    #[test]
    fn test_more_charts_is_business() {
        let store = deck(&[SlideKind::Chart, SlideKind::Text, SlideKind::Chart]);
        assert_eq!(suggest(store.slides()), TemplateChoice::Business);
    }

    #[test]
    fn test_more_text_is_minimal() {
        let store = deck(&[SlideKind::Text, SlideKind::Chart, SlideKind::Text]);
        assert_eq!(suggest(store.slides()), TemplateChoice::Minimal);
    }

    #[test]
    fn test_tie_is_creative() {
        let store = deck(&[SlideKind::Chart, SlideKind::Text]);
        assert_eq!(suggest(store.slides()), TemplateChoice::Creative);
    }

    #[test]
    fn test_bullets_count_toward_neither() {
        let store = deck(&[SlideKind::Bullet, SlideKind::Bullet, SlideKind::Text]);
        assert_eq!(suggest(store.slides()), TemplateChoice::Minimal);

        let store = deck(&[SlideKind::Bullet, SlideKind::Bullet]);
        assert_eq!(suggest(store.slides()), TemplateChoice::Creative);
    }
}
