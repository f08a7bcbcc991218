//! アップロード状態機械
//!
//! 選択・プレビュー・送信・正規化を束ね、外部に公開する
//! `UploadState` を唯一の書き手として更新する。
//!
//! ```text
//! Idle → Selected → Uploading → {Completed, Failed} → Selected | Idle
//! ```
//!
//! 送信ごとに世代番号を発行し、完了時に世代が最新でなければ結果を破棄する
//! （送信中に別ファイルを選択した場合は後の選択が優先）。

use crate::error::Result;
use crate::preview::{PreviewManager, PreviewStore, PreviewUrl};
use crate::selection::SelectedFile;
use crate::upload::{PredictTransport, UploadClient, UploadOutcome};
use food_recipe_common::RecipeView;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UploadPhase {
    #[default]
    Idle,
    Selected,
    Uploading,
    Completed,
    Failed,
}

impl UploadPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            UploadPhase::Idle => "idle",
            UploadPhase::Selected => "selected",
            UploadPhase::Uploading => "uploading",
            UploadPhase::Completed => "completed",
            UploadPhase::Failed => "failed",
        }
    }
}

/// 表示層に公開する状態
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UploadState {
    pub selected_file: Option<SelectedFile>,
    pub preview_url: Option<PreviewUrl>,
    pub loading: bool,
    pub recipe: Option<RecipeView>,
    pub error: Option<String>,
    pub completed_at: Option<String>,
    pub phase: UploadPhase,
}

/// 送信1回分の世代
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadTicket {
    generation: u64,
}

impl UploadTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

type Observer = Box<dyn FnMut(&UploadState)>;

pub struct UploadStateMachine<S: PreviewStore> {
    preview: PreviewManager<S>,
    state: UploadState,
    generation: u64,
    observers: Vec<Observer>,
}

impl<S: PreviewStore> UploadStateMachine<S> {
    pub fn new(store: S) -> Self {
        Self {
            preview: PreviewManager::new(store),
            state: UploadState::default(),
            generation: 0,
            observers: Vec::new(),
        }
    }

    pub fn state(&self) -> &UploadState {
        &self.state
    }

    pub fn preview(&self) -> &PreviewManager<S> {
        &self.preview
    }

    /// 状態遷移ごとに呼ばれるコールバックを登録
    pub fn subscribe(&mut self, observer: impl FnMut(&UploadState) + 'static) {
        self.observers.push(Box::new(observer));
    }

    /// ファイルを選択する（`None` で解除）
    ///
    /// 以前の結果・エラー・完了時刻を消去し、送信中のリクエストを無効化する。
    pub fn select(&mut self, file: Option<SelectedFile>) -> Result<()> {
        self.generation += 1;
        let result = self.preview.select(file);

        self.state.selected_file = self.preview.file().cloned();
        self.state.preview_url = self.preview.url().cloned();
        self.state.loading = false;
        self.state.recipe = None;
        self.state.error = None;
        self.state.completed_at = None;
        self.state.phase = if self.state.selected_file.is_some() {
            UploadPhase::Selected
        } else {
            UploadPhase::Idle
        };

        self.notify();
        result
    }

    /// 送信を開始する（ファイル未選択なら `None`、状態は変えない）
    pub fn begin_upload(&mut self) -> Option<(UploadTicket, SelectedFile)> {
        let file = self.state.selected_file.clone()?;
        Some((self.begin(), file))
    }

    /// 料理名での検索を開始する
    pub fn begin_lookup(&mut self) -> UploadTicket {
        self.begin()
    }

    fn begin(&mut self) -> UploadTicket {
        self.generation += 1;
        self.state.loading = true;
        self.state.phase = UploadPhase::Uploading;
        self.notify();
        UploadTicket {
            generation: self.generation,
        }
    }

    /// 送信結果を反映する
    ///
    /// チケットが最新世代でなければ何もせず `false` を返す。
    pub fn finish(&mut self, ticket: UploadTicket, outcome: UploadOutcome) -> bool {
        if ticket.generation != self.generation {
            tracing::debug!(
                ticket = ticket.generation,
                current = self.generation,
                "discarding stale upload result"
            );
            return false;
        }

        self.state.loading = false;
        match outcome {
            UploadOutcome::Completed {
                normalized,
                completed_at,
            } => {
                self.state.error = normalized.warning().map(str::to_string);
                self.state.recipe = Some(normalized.view);
                self.state.completed_at = Some(completed_at);
                self.state.phase = UploadPhase::Completed;
            }
            UploadOutcome::Failed(err) => {
                self.state.error = Some(err.to_string());
                self.state.recipe = None;
                self.state.completed_at = None;
                self.state.phase = UploadPhase::Failed;
            }
        }

        self.notify();
        true
    }

    /// 結果を得ずに送信を打ち切る
    ///
    /// チケットが最新なら `loading` を下ろし、送信前のフェーズに戻す。
    pub fn cancel(&mut self, ticket: UploadTicket) -> bool {
        if ticket.generation != self.generation || !self.state.loading {
            return false;
        }

        tracing::debug!(ticket = ticket.generation, "upload cancelled before completion");
        self.state.loading = false;
        self.state.phase = if self.state.selected_file.is_some() {
            UploadPhase::Selected
        } else {
            UploadPhase::Idle
        };
        self.notify();
        true
    }

    /// 選択中のファイルを送信して結果を反映する
    ///
    /// ファイル未選択なら通信せず `false` を返す。
    /// 完了前にfutureが破棄された場合も `loading` は元に戻る。
    pub async fn upload<T: PredictTransport>(&mut self, client: &UploadClient<T>) -> bool {
        let Some((ticket, file)) = self.begin_upload() else {
            return false;
        };
        let in_flight = InFlight::new(self, ticket);
        let outcome = client.send(&file).await;
        in_flight.complete(outcome)
    }

    /// 料理名でレシピ情報を取得して結果を反映する
    pub async fn lookup<T: PredictTransport>(&mut self, client: &UploadClient<T>, food: &str) -> bool {
        let ticket = self.begin_lookup();
        let in_flight = InFlight::new(self, ticket);
        let outcome = client.food_info(food).await;
        in_flight.complete(outcome)
    }

    fn notify(&mut self) {
        for observer in &mut self.observers {
            observer(&self.state);
        }
    }
}

/// 送信中の状態を保持するガード
///
/// `complete` されずに破棄されると `cancel` する。
struct InFlight<'a, S: PreviewStore> {
    machine: &'a mut UploadStateMachine<S>,
    ticket: UploadTicket,
    armed: bool,
}

impl<'a, S: PreviewStore> InFlight<'a, S> {
    fn new(machine: &'a mut UploadStateMachine<S>, ticket: UploadTicket) -> Self {
        Self {
            machine,
            ticket,
            armed: true,
        }
    }

    fn complete(mut self, outcome: UploadOutcome) -> bool {
        self.armed = false;
        self.machine.finish(self.ticket, outcome)
    }
}

impl<S: PreviewStore> Drop for InFlight<'_, S> {
    fn drop(&mut self) {
        if self.armed {
            self.machine.cancel(self.ticket);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upload::UploadError;
    use food_recipe_common::normalize_value;
    use serde_json::json;

    struct NullStore;

    impl PreviewStore for NullStore {
        fn create(&mut self, file: &SelectedFile) -> Result<PreviewUrl> {
            Ok(PreviewUrl::new(format!("blob:{}", file.file_name)))
        }

        fn revoke(&mut self, _url: &PreviewUrl) -> Result<()> {
            Ok(())
        }
    }

    fn jpg(name: &str) -> SelectedFile {
        SelectedFile::new(name, "image/jpeg", b"img".to_vec())
    }

    fn completed(value: serde_json::Value) -> UploadOutcome {
        UploadOutcome::Completed {
            normalized: normalize_value(&value).unwrap(),
            completed_at: "9:30 AM".into(),
        }
    }

    #[test]
    fn test_initial_state_idle() {
        let machine = UploadStateMachine::new(NullStore);
        assert_eq!(machine.state(), &UploadState::default());
        assert_eq!(machine.state().phase, UploadPhase::Idle);
    }

    #[test]
    fn test_begin_upload_without_file_is_noop() {
        let mut machine = UploadStateMachine::new(NullStore);
        assert!(machine.begin_upload().is_none());
        assert!(!machine.state().loading);
        assert_eq!(machine.state().phase, UploadPhase::Idle);
    }

    #[test]
    fn test_select_then_upload_completed() {
        let mut machine = UploadStateMachine::new(NullStore);
        machine.select(Some(jpg("sushi.jpg"))).unwrap();
        assert_eq!(machine.state().phase, UploadPhase::Selected);
        assert_eq!(machine.state().preview_url.as_ref().unwrap().as_str(), "blob:sushi.jpg");

        let (ticket, file) = machine.begin_upload().unwrap();
        assert_eq!(file.file_name, "sushi.jpg");
        assert!(machine.state().loading);
        assert_eq!(machine.state().phase, UploadPhase::Uploading);

        let applied = machine.finish(
            ticket,
            completed(json!({
                "predicted_food": "sushi",
                "llm_info": {
                    "recipe": {"name": "Sushi Roll", "ingredients": ["rice"], "steps": ["roll it"]},
                    "calories": "300"
                }
            })),
        );

        assert!(applied);
        let state = machine.state();
        assert!(!state.loading);
        assert_eq!(state.phase, UploadPhase::Completed);
        assert_eq!(state.error, None);
        assert_eq!(state.recipe.as_ref().unwrap().name, "Sushi Roll");
        assert_eq!(state.completed_at.as_deref(), Some("9:30 AM"));
    }

    #[test]
    fn test_insufficient_result_keeps_recipe_and_warning() {
        let mut machine = UploadStateMachine::new(NullStore);
        machine.select(Some(jpg("a.jpg"))).unwrap();
        let (ticket, _) = machine.begin_upload().unwrap();

        machine.finish(ticket, completed(json!({"predicted_food": "unknown_food"})));

        let state = machine.state();
        assert_eq!(state.phase, UploadPhase::Completed);
        assert_eq!(state.recipe.as_ref().unwrap().name, "Recipe name not available.");
        assert_eq!(
            state.error.as_deref(),
            Some("LLM did not return sufficient recipe information.")
        );
        assert!(state.completed_at.is_some());
    }

    #[test]
    fn test_failure_clears_recipe_and_timestamp() {
        let mut machine = UploadStateMachine::new(NullStore);
        machine.select(Some(jpg("a.jpg"))).unwrap();

        let (ticket, _) = machine.begin_upload().unwrap();
        machine.finish(ticket, completed(json!({"predicted_food": "x"})));

        let (ticket, _) = machine.begin_upload().unwrap();
        machine.finish(
            ticket,
            UploadOutcome::Failed(UploadError::Transport("Network failure".into())),
        );

        let state = machine.state();
        assert_eq!(state.phase, UploadPhase::Failed);
        assert!(!state.loading);
        assert_eq!(state.error.as_deref(), Some("Error uploading image: Network failure"));
        assert!(state.recipe.is_none());
        assert!(state.completed_at.is_none());
    }

    #[test]
    fn test_reselect_during_upload_discards_stale_result() {
        let mut machine = UploadStateMachine::new(NullStore);
        machine.select(Some(jpg("first.jpg"))).unwrap();
        let (stale, _) = machine.begin_upload().unwrap();

        machine.select(Some(jpg("second.jpg"))).unwrap();
        assert!(!machine.state().loading);

        let applied = machine.finish(stale, completed(json!({"predicted_food": "first"})));

        assert!(!applied);
        let state = machine.state();
        assert_eq!(state.phase, UploadPhase::Selected);
        assert!(state.recipe.is_none());
        assert!(state.error.is_none());
        assert!(state.completed_at.is_none());
        assert_eq!(state.selected_file.as_ref().unwrap().file_name, "second.jpg");
    }

    #[test]
    fn test_second_upload_supersedes_first() {
        let mut machine = UploadStateMachine::new(NullStore);
        machine.select(Some(jpg("a.jpg"))).unwrap();
        let (first, _) = machine.begin_upload().unwrap();
        let (second, _) = machine.begin_upload().unwrap();
        assert!(second.generation() > first.generation());

        assert!(machine.finish(second, completed(json!({"predicted_food": "latest"}))));
        assert!(!machine.finish(
            first,
            UploadOutcome::Failed(UploadError::Transport("late".into()))
        ));
        assert_eq!(machine.state().phase, UploadPhase::Completed);
    }

    #[test]
    fn test_select_clears_previous_results() {
        let mut machine = UploadStateMachine::new(NullStore);
        machine.select(Some(jpg("a.jpg"))).unwrap();
        let (ticket, _) = machine.begin_upload().unwrap();
        machine.finish(ticket, completed(json!({"predicted_food": "x"})));

        machine.select(None).unwrap();

        let state = machine.state();
        assert_eq!(state.phase, UploadPhase::Idle);
        assert!(state.selected_file.is_none());
        assert!(state.preview_url.is_none());
        assert!(state.recipe.is_none());
        assert!(state.error.is_none());
        assert!(state.completed_at.is_none());
    }

    #[test]
    fn test_observers_see_every_transition() {
        use std::cell::RefCell;
        use std::rc::Rc;

        let phases = Rc::new(RefCell::new(Vec::new()));
        let mut machine = UploadStateMachine::new(NullStore);
        {
            let phases = phases.clone();
            machine.subscribe(move |state| phases.borrow_mut().push((state.phase, state.loading)));
        }

        machine.select(Some(jpg("a.jpg"))).unwrap();
        let (ticket, _) = machine.begin_upload().unwrap();
        machine.finish(ticket, completed(json!({"predicted_food": "x"})));

        assert_eq!(
            *phases.borrow(),
            vec![
                (UploadPhase::Selected, false),
                (UploadPhase::Uploading, true),
                (UploadPhase::Completed, false),
            ]
        );
    }

    #[test]
    fn test_cancel_restores_phase() {
        let mut machine = UploadStateMachine::new(NullStore);
        machine.select(Some(jpg("a.jpg"))).unwrap();
        let (ticket, _) = machine.begin_upload().unwrap();

        assert!(machine.cancel(ticket));

        let state = machine.state();
        assert!(!state.loading);
        assert_eq!(state.phase, UploadPhase::Selected);
        // 二度目は何もしない
        assert!(!machine.cancel(ticket));
    }

    #[test]
    fn test_cancel_stale_ticket_is_ignored() {
        let mut machine = UploadStateMachine::new(NullStore);
        machine.select(Some(jpg("a.jpg"))).unwrap();
        let (first, _) = machine.begin_upload().unwrap();
        let (_second, _) = machine.begin_upload().unwrap();

        assert!(!machine.cancel(first));
        assert!(machine.state().loading);
        assert_eq!(machine.state().phase, UploadPhase::Uploading);
    }

    #[test]
    fn test_dropped_guard_cancels_lookup() {
        let mut machine = UploadStateMachine::new(NullStore);
        let ticket = machine.begin_lookup();
        drop(InFlight::new(&mut machine, ticket));

        assert!(!machine.state().loading);
        assert_eq!(machine.state().phase, UploadPhase::Idle);
    }

    #[test]
    fn test_phase_as_str() {
        assert_eq!(UploadPhase::Idle.as_str(), "idle");
        assert_eq!(UploadPhase::Failed.as_str(), "failed");
    }
}
