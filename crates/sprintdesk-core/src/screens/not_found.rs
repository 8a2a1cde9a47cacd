use crate::view::{Body, Screen, ScreenView};

pub struct NotFoundScreen {
    path: String,
}

impl NotFoundScreen {
    pub fn new(path: String) -> Self {
        Self { path }
    }
}

impl Screen for NotFoundScreen {
    fn mount(&mut self) {}

    fn render(&self) -> ScreenView {
        ScreenView::new(
            "Not found",
            Body::Text(vec![
                format!("Nothing lives at {}.", self.path),
                "Press g to go home.".to_string(),
            ]),
        )
    }
}
