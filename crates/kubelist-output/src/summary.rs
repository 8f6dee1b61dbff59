use std::borrow::Cow;
use std::time::Duration;

const SINGLE_IMAGE_WIDTH: usize = 40;
const FEW_IMAGES_WIDTH: usize = 30;
const MANY_IMAGES_WIDTH: usize = 25;

/// Human-scale age in the style of `kubectl get`: 45s, 12m, 5h, 3d
pub fn format_age(age: Duration) -> String {
    let seconds = age.as_secs();
    if seconds < 60 {
        format!("{seconds}s")
    } else if seconds < 3_600 {
        format!("{}m", seconds / 60)
    } else if seconds < 86_400 {
        format!("{}h", seconds / 3_600)
    } else {
        format!("{}d", seconds / 86_400)
    }
}

/// Summarize an image list for a table cell
pub fn format_images(images: &[String]) -> String {
    match images {
        [] => "<none>".to_string(),
        [only] => truncate(only, SINGLE_IMAGE_WIDTH).into_owned(),
        [first, second, rest @ ..] if rest.len() > 1 => format!(
            "{},{} +{} more",
            truncate(first, MANY_IMAGES_WIDTH),
            truncate(second, MANY_IMAGES_WIDTH),
            images.len() - 2
        ),
        few => few
            .iter()
            .map(|image| truncate(image, FEW_IMAGES_WIDTH))
            .collect::<Vec<_>>()
            .join(","),
    }
}

/// Truncate a string to `max_len` chars, ending in "..." if truncated.
/// Below four chars there is no room for the ellipsis and the string is cut.
pub fn truncate(s: &str, max_len: usize) -> Cow<'_, str> {
    if s.chars().count() <= max_len {
        return Cow::Borrowed(s);
    }
    if max_len <= 3 {
        return Cow::Owned(s.chars().take(max_len).collect());
    }
    let kept: String = s.chars().take(max_len - 3).collect();
    Cow::Owned(format!("{kept}..."))
}
