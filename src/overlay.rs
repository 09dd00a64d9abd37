use crate::frame::FrameInfo;
use crate::loaders::AssetKind;

const FPS_UPDATE_INTERVAL: f32 = 0.5;
const MAX_ERRORS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetStatus {
    Pending,
    Loaded,
    Failed(String),
}

/// What the overlay and the window title show
#[derive(Debug, Clone)]
pub struct StatusBoard {
    assets: Vec<(AssetKind, AssetStatus)>,
    errors: Vec<String>,
    task_count: usize,
    laps: Option<u64>,
    frame_count: u32,
    fps_timer: f32,
    fps: f32,
}

impl Default for StatusBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusBoard {
    pub fn new() -> Self {
        Self {
            assets: AssetKind::ALL.iter().map(|&kind| (kind, AssetStatus::Pending)).collect(),
            errors: Vec::new(),
            task_count: 0,
            laps: None,
            frame_count: 0,
            fps_timer: 0.0,
            fps: 0.0,
        }
    }

    pub fn set_asset(&mut self, kind: AssetKind, status: AssetStatus) {
        if let AssetStatus::Failed(message) = &status {
            self.push_error(format!("{}: {}", kind, message));
        }
        match self.assets.iter_mut().find(|(k, _)| *k == kind) {
            Some((_, current)) => *current = status,
            None => self.assets.push((kind, status)),
        }
    }

    pub fn asset(&self, kind: AssetKind) -> Option<&AssetStatus> {
        self.assets.iter().find(|(k, _)| *k == kind).map(|(_, s)| s)
    }

    pub fn assets(&self) -> &[(AssetKind, AssetStatus)] {
        &self.assets
    }

    pub fn failed(&self) -> Vec<AssetKind> {
        self.assets
            .iter()
            .filter(|(_, s)| matches!(s, AssetStatus::Failed(_)))
            .map(|(k, _)| *k)
            .collect()
    }

    /// Keeps the most recent few
    pub fn push_error(&mut self, message: String) {
        self.errors.push(message);
        if self.errors.len() > MAX_ERRORS {
            self.errors.remove(0);
        }
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn set_task_count(&mut self, count: usize) {
        self.task_count = count;
    }

    pub fn task_count(&self) -> usize {
        self.task_count
    }

    pub fn set_laps(&mut self, laps: u64) {
        self.laps = Some(laps);
    }

    pub fn laps(&self) -> Option<u64> {
        self.laps
    }

    pub fn record_frame(&mut self, frame: &FrameInfo) {
        self.frame_count += 1;
        self.fps_timer += frame.delta;

        if self.fps_timer >= FPS_UPDATE_INTERVAL {
            self.fps = self.frame_count as f32 / self.fps_timer;
            log::trace!("FPS: {:.1}", self.fps);
            self.frame_count = 0;
            self.fps_timer = 0.0;
        }
    }

    pub fn fps(&self) -> f32 {
        self.fps
    }

    /// `base`, plus the names of any assets that failed to load
    pub fn window_title(&self, base: &str) -> String {
        let failed = self.failed();
        if failed.is_empty() {
            return base.to_string();
        }
        let names: Vec<&str> = failed.iter().map(|k| k.name()).collect();
        format!("{} (failed to load: {})", base, names.join(", "))
    }
}

/// Status panel in the top-left corner
pub fn draw(ctx: &egui::Context, board: &StatusBoard) {
    egui::Window::new("Status")
        .title_bar(false)
        .resizable(false)
        .fixed_pos(egui::pos2(10.0, 10.0))
        .frame(egui::Frame::NONE)
        .show(ctx, |ui| {
            ui.label(
                egui::RichText::new(format!("{:.0}", board.fps()))
                    .size(48.0)
                    .color(egui::Color32::from_rgb(74, 158, 255)),
            );
            ui.label(egui::RichText::new("FPS").size(12.0).color(egui::Color32::GRAY));
            ui.add_space(6.0);

            for (kind, status) in board.assets() {
                let (text, color) = match status {
                    AssetStatus::Pending => (format!("{}: loading", kind), egui::Color32::GRAY),
                    AssetStatus::Loaded => (format!("{}: ready", kind), egui::Color32::from_rgb(120, 200, 120)),
                    AssetStatus::Failed(_) => (format!("{}: failed", kind), egui::Color32::from_rgb(230, 90, 90)),
                };
                ui.label(egui::RichText::new(text).size(12.0).color(color));
            }

            let mut line = format!("tasks: {}", board.task_count());
            if let Some(laps) = board.laps() {
                line.push_str(&format!("  laps: {}", laps));
            }
            ui.label(egui::RichText::new(line).size(12.0).color(egui::Color32::GRAY));

            for error in board.errors() {
                ui.label(
                    egui::RichText::new(error)
                        .size(11.0)
                        .color(egui::Color32::from_rgb(230, 90, 90)),
                );
            }
        });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_pending() {
        let board = StatusBoard::new();
        assert_eq!(board.asset(AssetKind::Fish), Some(&AssetStatus::Pending));
        assert_eq!(board.asset(AssetKind::Landscape), Some(&AssetStatus::Pending));
        assert_eq!(board.window_title("fish-flow"), "fish-flow");
    }

    #[test]
    fn failure_shows_in_title_and_errors() {
        let mut board = StatusBoard::new();
        board.set_asset(AssetKind::Fish, AssetStatus::Failed("timed out".into()));
        board.set_asset(AssetKind::Landscape, AssetStatus::Loaded);

        assert_eq!(board.failed(), vec![AssetKind::Fish]);
        assert_eq!(board.window_title("fish-flow"), "fish-flow (failed to load: fish)");
        assert_eq!(board.errors(), &["fish: timed out".to_string()]);
    }

    #[test]
    fn error_list_is_bounded() {
        let mut board = StatusBoard::new();
        for i in 0..8 {
            board.push_error(format!("error {}", i));
        }
        assert_eq!(board.errors().len(), MAX_ERRORS);
        assert_eq!(board.errors()[0], "error 3");
    }

    #[test]
    fn fps_updates_every_half_second() {
        let mut board = StatusBoard::new();
        for n in 0..30 {
            board.record_frame(&FrameInfo::new(n, n as f32 / 60.0, 1.0 / 60.0));
        }
        // 30 frames at 60 Hz = exactly 0.5 s, may land either side of the boundary
        for n in 30..32 {
            board.record_frame(&FrameInfo::new(n, n as f32 / 60.0, 1.0 / 60.0));
        }
        assert!((board.fps() - 60.0).abs() < 1.0);
    }
}
