use stream_pager::{CountHint, PageSource};
use tracing::info;

/// A finite book; each page is one chapter.
#[derive(Debug)]
pub struct Chapters {
    titles: Vec<String>,
    opened: usize,
}

impl Chapters {
    pub fn sample() -> Self {
        let titles = (1..=12).map(|n| format!("Chapter {n}")).collect();
        Self { titles, opened: 0 }
    }

    fn last(&self) -> usize {
        self.titles.len().saturating_sub(1)
    }
}

impl PageSource for Chapters {
    type Key = usize;
    type Handle = String;

    fn initial_key(&self) -> usize {
        0
    }

    fn next_key(&self, chapter: &usize) -> Option<usize> {
        (*chapter < self.last()).then_some(chapter + 1)
    }

    fn prev_key(&self, chapter: &usize) -> Option<usize> {
        chapter.checked_sub(1)
    }

    fn count_hint(&self) -> CountHint {
        CountHint::Finite
    }

    fn instantiate(&mut self, chapter: &usize) -> Option<String> {
        let title = self.titles.get(*chapter)?.clone();
        self.opened += 1;
        info!(opened = self.opened, "Typesetting {title}");
        Some(title)
    }

    fn destroy(&mut self, _chapter: &usize, title: String) {
        info!("Dropping {title}");
    }

    fn clamp_key(&self, chapter: usize) -> usize {
        chapter.min(self.last())
    }
}
