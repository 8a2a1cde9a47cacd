use tracing::{info, warn};

use super::{pending_body, ScreenContext};
use crate::models::{Member, MembershipStatus, Message, ProjectMembership};
use crate::view::{scroll_input, Body, Fetch, Input, InputOutcome, ListView, Screen, ScreenView};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Accept,
    Decline,
    Leave,
}

impl Action {
    fn done(self) -> &'static str {
        match self {
            Action::Accept => "Invitation accepted",
            Action::Decline => "Invitation declined",
            Action::Leave => "Left project",
        }
    }
}

pub struct ManagementScreen {
    cx: ScreenContext,
    memberships: Fetch<Vec<ProjectMembership>>,
    selected: usize,
    members: Fetch<Vec<Member>>,
    action: Fetch<Message>,
    last_action: Option<Action>,
    message: Option<String>,
}

impl ManagementScreen {
    pub fn new(cx: ScreenContext) -> Self {
        Self {
            cx,
            memberships: Fetch::new(),
            selected: 0,
            members: Fetch::new(),
            action: Fetch::new(),
            last_action: None,
            message: None,
        }
    }

    fn reload(&mut self) {
        self.members.reset();
        self.cx
            .load(&mut self.memberships, |api, token| async move {
                api.managed_projects(&token).await
            });
    }

    fn selected_membership(&self) -> Option<&ProjectMembership> {
        self.memberships.data().and_then(|m| m.get(self.selected))
    }

    fn show_members(&mut self) {
        let Some(project_id) = self.selected_membership().map(|m| m.project.id) else {
            return;
        };
        self.cx
            .load(&mut self.members, move |api, token| async move {
                api.project_members(&token, project_id).await
            });
    }

    fn run(&mut self, action: Action) {
        if self.action.is_loading() {
            return;
        }
        let Some((project_id, status)) = self
            .selected_membership()
            .map(|m| (m.project.id, m.status))
        else {
            return;
        };
        let allowed = match action {
            Action::Accept | Action::Decline => status == MembershipStatus::Pending,
            Action::Leave => status == MembershipStatus::Accepted,
        };
        if !allowed {
            self.message = Some(match action {
                Action::Leave => "Only accepted projects can be left".to_string(),
                _ => "No pending invitation for this project".to_string(),
            });
            return;
        }

        self.last_action = Some(action);
        self.message = None;
        self.cx.load(&mut self.action, move |api, token| async move {
            match action {
                Action::Accept => api.decide_membership(&token, project_id, true).await,
                Action::Decline => api.decide_membership(&token, project_id, false).await,
                Action::Leave => api.leave_project(&token, project_id).await,
            }
        });
    }

    fn apply_action(&mut self) {
        let action = self.last_action.take();
        if let Some(e) = self.action.error() {
            warn!(error = %e, "Project membership change failed");
            self.message = Some(format!("Request failed: {}", e.user_message()));
            return;
        }
        if let Some(action) = action {
            info!(?action, "Project membership changed");
            self.message = Some(action.done().to_string());
        }
        self.reload();
    }
}

fn membership_row(m: &ProjectMembership) -> String {
    let status = match m.status {
        MembershipStatus::Pending => "pending",
        MembershipStatus::Accepted => "member",
    };
    match m.owner {
        Some(ref owner) => format!("{} ({}, owner {})", m.project.name, status, owner),
        None => format!("{} ({})", m.project.name, status),
    }
}

impl Screen for ManagementScreen {
    fn mount(&mut self) {
        self.reload();
    }

    fn poll(&mut self) -> bool {
        let mut changed = self.memberships.poll();
        changed |= self.members.poll();
        if self.action.poll() {
            self.apply_action();
            changed = true;
        }
        changed
    }

    fn render(&self) -> ScreenView {
        let body = pending_body(&self.memberships).unwrap_or_else(|| {
            let items = self
                .memberships
                .data()
                .map(|m| m.iter().map(membership_row).collect())
                .unwrap_or_default();
            let mut panels = vec![ListView::new(
                "Shared projects",
                items,
                self.selected,
                "You are not a member of any shared project",
            )];
            if let Some(members) = self.members.data() {
                panels.push(ListView::new(
                    "Members",
                    members.iter().map(|m| m.username.clone()).collect(),
                    0,
                    "No members",
                ));
            }
            Body::Panels {
                header: self.message.iter().cloned().collect(),
                panels,
                active: 0,
            }
        });
        ScreenView::new("Project management", body)
            .with_breadcrumbs(&["Home", "Project management"])
            .with_hint("y: accept  n: decline  l: leave  Enter: members  r: reload")
    }

    fn handle_input(&mut self, input: Input) -> InputOutcome {
        match input {
            Input::Char('y') => self.run(Action::Accept),
            Input::Char('n') => self.run(Action::Decline),
            Input::Char('l') => self.run(Action::Leave),
            Input::Char('r') => self.reload(),
            Input::Enter => self.show_members(),
            other => {
                let len = self.memberships.data().map(Vec::len).unwrap_or(0);
                let before = self.selected;
                let outcome = scroll_input(&mut self.selected, len, other);
                if self.selected != before {
                    self.members.reset();
                }
                return outcome;
            }
        }
        InputOutcome::Handled
    }

    fn unmount(&mut self) {
        self.memberships.cancel();
        self.members.cancel();
        self.action.cancel();
    }
}
