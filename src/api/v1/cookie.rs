/// Attributes of the HttpOnly cookie that carries the refresh token.
#[derive(Debug, Clone)]
pub struct RefreshCookie {
    pub name: String,
    pub path: String,
    pub secure: bool,
    pub max_age_secs: u64,
}

impl RefreshCookie {
    pub fn set(&self, token: &str) -> String {
        self.render(token, self.max_age_secs)
    }

    pub fn clear(&self) -> String {
        self.render("", 0)
    }

    fn render(&self, value: &str, max_age: u64) -> String {
        let secure = if self.secure { "; Secure" } else { "" };
        format!(
            "{}={}; Max-Age={}; Path={}; HttpOnly; SameSite=Strict{}",
            self.name, value, max_age, self.path, secure
        )
    }

    /// Pull this cookie's value out of a raw `Cookie` request header.
    ///
    /// `warp::cookie::optional` needs a `&'static str` name; this one comes
    /// from settings.
    pub fn extract(&self, header: Option<&str>) -> Option<String> {
        header?
            .split(';')
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == self.name)
            .map(|(_, value)| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }
}
