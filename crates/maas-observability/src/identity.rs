/// Caller identity attached to every observation of a span
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Identity {
    pub user_id: Option<String>,
    pub session_id: Option<String>,
}

impl Identity {
    /// Build an identity, treating blank ids as absent
    pub fn new(user_id: Option<&str>, session_id: Option<&str>) -> Self {
        Self {
            user_id: non_blank(user_id),
            session_id: non_blank(session_id),
        }
    }

    pub const fn is_empty(&self) -> bool {
        self.user_id.is_none() && self.session_id.is_none()
    }

    /// Field-wise overlay: ids set on `self` win, unset ones come from `base`
    #[must_use]
    pub fn merged_over(&self, base: &Self) -> Self {
        Self {
            user_id: self.user_id.clone().or_else(|| base.user_id.clone()),
            session_id: self.session_id.clone().or_else(|| base.session_id.clone()),
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(ToOwned::to_owned)
}
