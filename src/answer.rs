//! Flattening of worker answer documents.
//!
//! The Task Service returns each submission as a `QuestionFormAnswers` XML
//! document:
//!
//! ```xml
//! <QuestionFormAnswers xmlns="http://mechanicalturk.amazonaws.com/...">
//!   <Answer>
//!     <QuestionIdentifier>q1</QuestionIdentifier>
//!     <FreeText>Yes</FreeText>
//!   </Answer>
//! </QuestionFormAnswers>
//! ```
//!
//! Only free-text answers are understood. Element names are matched by
//! local name, so the namespace declaration is irrelevant.

use indexmap::IndexMap;
use roxmltree::{Document, Node};
use thiserror::Error;

const ANSWER: &str = "Answer";
const QUESTION_IDENTIFIER: &str = "QuestionIdentifier";
const FREE_TEXT: &str = "FreeText";

/// Errors raised while flattening an answer document.
#[derive(Debug, Error)]
pub enum AnswerError {
    /// The document is not well-formed XML.
    #[error("not well-formed XML: {0}")]
    Xml(#[from] roxmltree::Error),

    /// An `Answer` element lacks one of the elements it must contain.
    #[error("answer #{position} has no <{element}> element")]
    MissingElement {
        element: &'static str,
        /// 1-based position of the offending `Answer` in the document.
        position: usize,
    },
}

/// Flattens an answer document into `question identifier -> answer text`.
///
/// Keys keep document order. When an identifier repeats, the later answer
/// overwrites the earlier value. Text split across several text nodes (for
/// example around a comment) is joined with single spaces.
///
/// # Examples
///
/// ```
/// use mturkish::answer::flatten_answer;
///
/// let xml = "<QuestionFormAnswers><Answer>\
///     <QuestionIdentifier>q1</QuestionIdentifier><FreeText>Yes</FreeText>\
///     </Answer></QuestionFormAnswers>";
/// let answers = flatten_answer(xml).unwrap();
/// assert_eq!(answers["q1"], "Yes");
/// ```
pub fn flatten_answer(xml: &str) -> Result<IndexMap<String, String>, AnswerError> {
    let doc = Document::parse(xml)?;
    let mut answers = IndexMap::new();

    let elements = doc
        .descendants()
        .filter(|node| node.is_element() && node.has_tag_name(ANSWER));
    for (index, answer) in elements.enumerate() {
        let position = index + 1;
        let key = joined_text(first_descendant(answer, QUESTION_IDENTIFIER, position)?);
        let value = joined_text(first_descendant(answer, FREE_TEXT, position)?);
        answers.insert(key, value);
    }

    Ok(answers)
}

fn first_descendant<'a, 'input>(
    node: Node<'a, 'input>,
    element: &'static str,
    position: usize,
) -> Result<Node<'a, 'input>, AnswerError> {
    node.descendants()
        .find(|child| child.is_element() && child.has_tag_name(element))
        .ok_or(AnswerError::MissingElement { element, position })
}

/// Space-joins the text nodes directly under `node`, ignoring nested
/// elements and comments.
fn joined_text(node: Node<'_, '_>) -> String {
    node.children()
        .filter(|child| child.is_text())
        .filter_map(|child| child.text())
        .collect::<Vec<_>>()
        .join(" ")
}
