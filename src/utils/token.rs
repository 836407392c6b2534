//! Random tokens for temporary file names

const TOKEN_LEN: usize = 8;

/// Eight lowercase hex characters from four random bytes.
pub fn random_token() -> String {
    hex::encode(rand::random::<[u8; 4]>())
}

/// `<stem>_<token>.<extension>`, the name of a temporary archive or staged upload.
pub fn scratch_file_name(stem: &str, extension: &str) -> String {
    format!("{stem}_{}.{extension}", random_token())
}

/// Whether `name` looks like something [`scratch_file_name`] produced for a
/// zip archive or a staged upload.
pub fn is_scratch_file_name(name: &str) -> bool {
    let Some(stem) = name
        .strip_suffix(".zip")
        .or_else(|| name.strip_suffix(".part"))
    else {
        return false;
    };
    match stem.rsplit_once('_') {
        Some((_, token)) => {
            token.len() == TOKEN_LEN
                && token
                    .bytes()
                    .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
        }
        None => false,
    }
}
