// Built-in question bank used when the LLM is unavailable.

use homeroom_core::Level;

use crate::question::Question;

type Bank = [(&'static str, f64); 10];

const P1: Bank = [
    ("3 + 5 = ?", 8.0),
    ("12 - 4 = ?", 8.0),
    ("2 × 6 = ?", 12.0),
    ("10 - 3 = ?", 7.0),
    ("Tom has 4 apples and gets 5 more. How many apples does he have?", 9.0),
    ("15 - 5 = ?", 10.0),
    ("4 × 3 = ?", 12.0),
    ("9 + 1 = ?", 10.0),
    ("There are 8 red balls and 2 blue balls. How many balls total?", 10.0),
    ("3 × 2 = ?", 6.0),
];

const P2: Bank = [
    ("25 + 18 = ?", 43.0),
    ("50 - 23 = ?", 27.0),
    ("6 × 7 = ?", 42.0),
    ("30 ÷ 5 = ?", 6.0),
    ("Sarah has $34 and buys a book for $21. How much money does she have left?", 13.0),
    ("48 - 17 = ?", 31.0),
    ("8 × 5 = ?", 40.0),
    ("24 ÷ 4 = ?", 6.0),
    ("A box has 15 candies. After eating 7, how many are left?", 8.0),
    ("60 - 28 = ?", 32.0),
];

const P3: Bank = [
    ("234 + 156 = ?", 390.0),
    ("500 - 278 = ?", 222.0),
    ("9 × 8 = ?", 72.0),
    ("48 ÷ 6 = ?", 8.0),
    ("Rabbits and chickens have 10 heads and 28 legs total. How many rabbits?", 4.0),
    ("600 - 234 = ?", 366.0),
    ("11 × 7 = ?", 77.0),
    ("56 ÷ 8 = ?", 7.0),
    ("A rectangle has length 12cm and width 8cm. What is the area?", 96.0),
    ("1/2 + 1/4 = ?", 0.75),
];

const P4: Bank = [
    ("1234 + 567 = ?", 1801.0),
    ("2000 - 845 = ?", 1155.0),
    ("12 × 15 = ?", 180.0),
    ("144 ÷ 12 = ?", 12.0),
    ("Ducks and goats have 15 heads and 42 feet. How many goats?", 6.0),
    ("3000 - 1678 = ?", 1322.0),
    ("25 × 4 = ?", 100.0),
    ("Apples cost $3 each. If you buy 5 apples, how much do you pay?", 15.0),
    ("A box with length 10cm, width 6cm, height 4cm. What is the volume?", 240.0),
    ("0.5 + 0.75 = ?", 1.25),
];

const P5: Bank = [
    ("3/4 × 2/3 = ?", 0.5),
    ("15% of 80 = ?", 12.0),
    ("0.75 + 0.25 = ?", 1.0),
    ("2/5 of 100 = ?", 40.0),
    ("A shirt costs $50. With a 20% discount, what is the final price?", 40.0),
    ("8/10 as percentage = ?", 80.0),
    ("Solve: 3x - 5 = 10, x = ?", 5.0),
    ("5/8 × 16 = ?", 10.0),
    ("If ratio of boys to girls is 3:5 and there are 24 boys, how many girls?", 40.0),
    ("20% of 150 = ?", 30.0),
];

const P6: Bank = [
    ("120% of 50 = ?", 60.0),
    ("Solve: 2x + 3 = 11, x = ?", 4.0),
    ("30% of 250 = ?", 75.0),
    ("Ratio 2:3, if first is 10, second = ?", 15.0),
    ("Area of triangle with base 12cm and height 10cm = ?", 60.0),
    ("Solve: 3x - 5 = 10, x = ?", 5.0),
    ("5/8 × 16 = ?", 10.0),
    ("45% of 200 = ?", 90.0),
    ("Solve: x/2 + 3 = 8, x = ?", 10.0),
    ("Perimeter of rectangle: length 8cm, width 5cm = ?", 26.0),
];

const PLSE: Bank = [
    ("Solve: 2x + 5 = 17, x = ?", 6.0),
    ("60% of 180 = ?", 108.0),
    ("A table costs $100 and profit margin is 25%. Selling price = ?", 125.0),
    ("Ratio 3:5:2, if total is 100, what is the first part?", 30.0),
    ("Circumference of circle with radius 5cm (π≈3.14) = ?", 31.4),
    ("Solve: 3(x - 2) = 15, x = ?", 7.0),
    ("Area of triangle with base 10cm and height 8cm = ?", 40.0),
    ("A discount of 30% on $200, final price = ?", 140.0),
    ("Speed is 60km/h, travel time is 2.5 hours, distance = ?", 150.0),
    ("Mean of 10, 20, 30, 40, 50 = ?", 30.0),
];

fn bank(level: Level) -> &'static Bank {
    match level {
        Level::P1 => &P1,
        Level::P2 => &P2,
        Level::P3 => &P3,
        Level::P4 => &P4,
        Level::P5 => &P5,
        Level::P6 => &P6,
        Level::Plse => &PLSE,
    }
}

/// The first `count` questions of the bank for `level` (at most ten).
pub fn fallback_questions(level: Level, count: usize) -> Vec<Question> {
    bank(level)
        .iter()
        .take(count)
        .map(|(text, answer)| Question::new(*text, *answer))
        .collect()
}
