use greenbench_engine::cards::parse_cards;
use greenbench_engine::hand::evaluate_hand;
use greenbench_engine::pot::{build_side_pots, distribute, uncalled_excess, Pot};

#[test]
fn three_way_all_in_builds_main_and_side_pot() {
    let pots = build_side_pots(&[300, 700, 700], &[false, false, false]);
    assert_eq!(
        pots,
        vec![
            Pot {
                amount: 900,
                eligible: vec![0, 1, 2]
            },
            Pot {
                amount: 800,
                eligible: vec![1, 2]
            },
        ]
    );
}

#[test]
fn folded_chips_stay_in_the_pot() {
    let pots = build_side_pots(&[500, 500, 200], &[false, false, true]);
    assert_eq!(pots.len(), 2);
    assert_eq!(pots[0].eligible, vec![0, 1]);
    assert_eq!(pots.iter().map(|p| p.amount).sum::<u32>(), 1_200);
}

#[test]
fn short_all_in_wins_only_the_main_pot() {
    let pots = build_side_pots(&[300, 700, 700], &[false, false, false]);
    let strengths = [
        Some(evaluate_hand(&parse_cards("As Ad Ah Kc Kd 2s 3c").unwrap())),
        Some(evaluate_hand(&parse_cards("Qs Qd 9h 8c 4d 2d 3h").unwrap())),
        Some(evaluate_hand(&parse_cards("Js Jd 9h 8c 4d 2d 3h").unwrap())),
    ];
    let (payouts, awards) = distribute(&pots, &strengths, &[1, 2, 0]);
    assert_eq!(payouts, vec![900, 800, 0]);
    assert_eq!(awards[0].winners, vec![0]);
    assert_eq!(awards[1].winners, vec![1]);
    assert_eq!(payouts.iter().sum::<u32>(), 1_700);
}

#[test]
fn odd_chip_goes_to_first_winner_left_of_button() {
    let pots = vec![Pot {
        amount: 301,
        eligible: vec![0, 1, 2],
    }];
    let tie = evaluate_hand(&parse_cards("As Ks Qs Js 9d").unwrap());
    let worse = evaluate_hand(&parse_cards("2c 3d 5h 7s 9c").unwrap());
    let strengths = [Some(tie), Some(worse), Some(tie)];
    // button on seat 1: seat 2 is first to its left
    let (payouts, _) = distribute(&pots, &strengths, &[2, 0, 1]);
    assert_eq!(payouts, vec![150, 0, 151]);
}

#[test]
fn uncalled_bet_is_the_unmatched_top() {
    assert_eq!(uncalled_excess(&[900, 300]), Some((0, 600)));
    assert_eq!(uncalled_excess(&[300, 700, 700]), None);
}

#[test]
fn empty_contributions_build_no_pots() {
    assert!(build_side_pots(&[0, 0], &[false, false]).is_empty());
}
