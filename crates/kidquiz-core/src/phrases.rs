//! Pre-authored mascot lines and the local assessment library.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::model::{option_letter, AssessmentResult, Tier};

/// Lines for a correct answer.
pub const CORRECT_PRAISES: &[&str] = &[
    "Giỏi quá xá luôn con ơi! 😍",
    "Đúng bóc luôn nè, thầy khen nhen! 🌟",
    "Chính xác luôn, con xuất sắc quá chừng! 💯",
    "Hoan hô! Làm tốt lắm luôn đó con! 👏",
    "Chuẩn không cần chỉnh luôn nè! ✨",
];

/// Lines for a wrong answer.
pub const INCORRECT_ENCOURAGEMENTS: &[&str] = &[
    "Hổng sao đâu, lần sau mình làm lại nhen! 💪",
    "Sai mất tiêu rồi, ráng lên chút xíu nữa nè! 🍀",
    "Suýt soát hà, cố lên nghe con! 🍄",
    "Bình tĩnh nè, đọc kỹ lại chút xíu nhen con! 🌈",
    "Cẩn thận một xíu nữa là đúng rồi đó! 🦉",
];

/// Spoken when the countdown runs out.
pub const TIMEOUT_MESSAGE: &str = "Hết thời gian suy nghĩ, mời cả lớp giơ bảng!";

/// Pick the mascot line for an answer.
pub fn answer_line<R: Rng + ?Sized>(correct: bool, rng: &mut R) -> &'static str {
    let pool = if correct {
        CORRECT_PRAISES
    } else {
        INCORRECT_ENCOURAGEMENTS
    };
    pool.choose(rng).copied().unwrap_or_default()
}

/// Line announcing the correct option after a timeout.
pub fn reveal_line(correct_index: usize) -> String {
    format!("Đáp án đúng là {} nhen!", option_letter(correct_index))
}

/// One entry of the local assessment library.
#[derive(Debug, Clone, Copy)]
pub struct AssessmentEntry {
    pub message: &'static str,
    pub teacher_comment: &'static str,
    pub reward_emoji: &'static str,
    pub reward_name: &'static str,
}

impl AssessmentEntry {
    pub fn to_result(self, level: Tier) -> AssessmentResult {
        AssessmentResult {
            message: self.message.to_string(),
            teacher_comment: self.teacher_comment.to_string(),
            level,
            reward_emoji: self.reward_emoji.to_string(),
            reward_name: self.reward_name.to_string(),
        }
    }
}

const COMPLETED_WELL: &[AssessmentEntry] = &[
    AssessmentEntry {
        message: "Xuất sắc quá xá luôn con ơi!",
        teacher_comment: "Con nắm bài rất vững, thực hiện các thao tác cực kỳ chuẩn xác. Thầy rất tự hào về sự cẩn thận của con. Tiếp tục phát huy nhen!",
        reward_emoji: "🏆",
        reward_name: "Cúp Vàng Thông Thái",
    },
    AssessmentEntry {
        message: "Đỉnh của chóp luôn nè!",
        teacher_comment: "Kiến thức về an toàn giao thông của con thật đáng nể. Con không chỉ làm đúng mà còn làm rất nhanh nữa. Giỏi lắm nhen!",
        reward_emoji: "🌟",
        reward_name: "Sao Mai Toả Sáng",
    },
    AssessmentEntry {
        message: "Dữ dằn chưa, đúng hết trơn luôn!",
        teacher_comment: "Con học bài rất kỹ nè. Thầy khen con biết quan sát và chọn đáp án rất thông minh. Ráng giữ vững phong độ này nghe chưa!",
        reward_emoji: "🚀",
        reward_name: "Tên Lửa Siêu Tốc",
    },
];

const COMPLETED: &[AssessmentEntry] = &[
    AssessmentEntry {
        message: "Làm tốt lắm, cố gắng thêm chút nữa nhen!",
        teacher_comment: "Con đã nắm được những kiến thức cơ bản rồi đó. Chỉ cần chú ý đọc kỹ câu hỏi hơn một xíu nữa là đạt điểm tối đa luôn nè. Cố lên con!",
        reward_emoji: "🚲",
        reward_name: "Tay Lái Vững Vàng",
    },
    AssessmentEntry {
        message: "Khá lắm, Thầy thấy con rất nỗ lực!",
        teacher_comment: "Kết quả này cho thấy con có sự đầu tư học bài nè. Có một vài chỗ nhỏ cần lưu ý thêm, nhưng nhìn chung con làm rất tốt rồi nhen!",
        reward_emoji: "🛡️",
        reward_name: "Khiên Bảo Vệ An Toàn",
    },
];

const NOT_COMPLETED: &[AssessmentEntry] = &[
    AssessmentEntry {
        message: "Hổng sao nè, mình cùng ôn lại nha!",
        teacher_comment: "Thầy thấy con rất cố gắng nhưng có lẽ chủ đề này hơi mới với con đúng không? Đừng buồn nhen, đọc lại bài một lần nữa rồi thử lại, Thầy tin con sẽ làm tốt hơn!",
        reward_emoji: "📚",
        reward_name: "Mầm Nhỏ Chăm Chỉ",
    },
    AssessmentEntry {
        message: "Cố lên con ơi, Thầy luôn ủng hộ con!",
        teacher_comment: "Sai sót là chuyện bình thường mà, quan trọng là mình học được gì sau đó nè. Con hãy xem kỹ các câu sai rồi làm lại lần nữa cho Thầy xem nhen!",
        reward_emoji: "🌱",
        reward_name: "Hạt Giống Kiên Trì",
    },
];

/// The local assessment pool for a tier.
pub fn assessment_pool(tier: Tier) -> &'static [AssessmentEntry] {
    match tier {
        Tier::CompletedWell => COMPLETED_WELL,
        Tier::Completed => COMPLETED,
        Tier::NotCompleted => NOT_COMPLETED,
    }
}
