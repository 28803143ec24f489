mod failure_cases;
mod scenario_case1;
