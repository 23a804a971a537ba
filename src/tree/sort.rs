//! Sibling ordering

use crate::element::MailboxElement;
use crate::namespace::INBOX;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::iter::Peekable;
use std::str::Chars;

/// Case-insensitive natural comparison: digit runs compare by value,
/// so `Archive 9` sorts before `Archive 10`.
#[must_use]
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut a = a.chars().peekable();
    let mut b = b.chars().peekable();

    loop {
        match (a.peek().copied(), b.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) if x.is_ascii_digit() && y.is_ascii_digit() => {
                let run_a = digit_run(&mut a);
                let run_b = digit_run(&mut b);
                let trimmed_a = run_a.trim_start_matches('0');
                let trimmed_b = run_b.trim_start_matches('0');
                let ord = trimmed_a
                    .len()
                    .cmp(&trimmed_b.len())
                    .then_with(|| trimmed_a.cmp(trimmed_b));
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            (Some(x), Some(y)) => {
                let ord = x.to_lowercase().cmp(y.to_lowercase());
                if ord != Ordering::Equal {
                    return ord;
                }
                a.next();
                b.next();
            }
        }
    }
}

fn digit_run(chars: &mut Peekable<Chars<'_>>) -> String {
    let mut run = String::new();
    while let Some(c) = chars.next_if(char::is_ascii_digit) {
        run.push(c);
    }
    run
}

/// Order siblings for display.
///
/// At the root INBOX comes first. IMAP mailboxes sort by label, and
/// synthetic elements (namespace headers, the virtual folder root)
/// follow them.
pub(crate) fn sort_siblings(
    siblings: &mut [String],
    elements: &HashMap<String, MailboxElement>,
    at_root: bool,
) {
    let rank = |value: &str| -> u8 {
        if at_root && value == INBOX {
            0
        } else if elements.get(value).is_some_and(MailboxElement::is_nonimap) {
            2
        } else {
            1
        }
    };

    siblings.sort_by(|a, b| {
        rank(a)
            .cmp(&rank(b))
            .then_with(|| natural_cmp(label(elements, a), label(elements, b)))
            .then_with(|| a.cmp(b))
    });
}

/// Order siblings by label alone.
pub(crate) fn sort_by_label(siblings: &mut [String], elements: &HashMap<String, MailboxElement>) {
    siblings.sort_by(|a, b| {
        natural_cmp(label(elements, a), label(elements, b)).then_with(|| a.cmp(b))
    });
}

/// Parents-first order for batches of mailbox names, INBOX leading.
pub(crate) fn hierarchy_cmp(a: &str, b: &str) -> Ordering {
    (b == INBOX).cmp(&(a == INBOX)).then_with(|| a.cmp(b))
}

fn label<'a>(elements: &'a HashMap<String, MailboxElement>, value: &'a str) -> &'a str {
    elements.get(value).map_or(value, |elt| elt.label.as_str())
}
