use crate::envs::Objects;
use crate::mdps::mdp::*;
use itertools::Itertools;
use ndarray::Array2;

/// Text counterpart of a heat-map plot: one line per row, cells right
/// aligned to a common width. Goal is `G`, obstacles are `O`.
fn render<T>(objects: &Objects, grid: &Array2<T>, label: impl Fn(&T) -> String) -> String {
    let labels = grid
        .rows()
        .into_iter()
        .enumerate()
        .map(|(r, row)| {
            row.iter()
                .enumerate()
                .map(|(c, x)| {
                    if objects.is_goal((r, c)) {
                        "G".to_string()
                    } else if objects.is_obstacle((r, c)) {
                        "O".to_string()
                    } else {
                        label(x)
                    }
                })
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>();
    let width = labels.iter().flatten().map(String::len).max().unwrap_or_default();

    labels
        .iter()
        .map(|row| row.iter().map(|l| format!("{l:>width$}")).join(" "))
        .join("\n")
}

pub fn render_policy(objects: &Objects, pi: &Array2<Action>) -> String {
    render(objects, pi, |a| a.name().to_string())
}

pub fn render_values(objects: &Objects, v: &Array2<f64>) -> String {
    render(objects, v, |x| format!("{x:.2}"))
}
