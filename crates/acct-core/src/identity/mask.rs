const VISIBLE_HEAD: usize = 8;
const VISIBLE_TAIL: usize = 4;

/// Display form of a token: first and last few characters only.
///
/// Cosmetic; short tokens are hidden entirely rather than half-revealed.
pub fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.trim().chars().collect();
    if chars.len() <= VISIBLE_HEAD + VISIBLE_TAIL {
        return String::from("****");
    }

    let head: String = chars[..VISIBLE_HEAD].iter().collect();
    let tail: String = chars[chars.len() - VISIBLE_TAIL..].iter().collect();
    format!("{head}...{tail}")
}
