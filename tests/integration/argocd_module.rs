use reliability_infra::scenarios::{argocd_module_plan, argocd_plan_options, PLAN_FILE};

use crate::common::live;

#[test]
fn plan_request_targets_module_and_writes_plan_file() {
    let run = live();
    let options = argocd_plan_options(&run.settings);
    assert_eq!(options.dir(), run.settings.argocd_module_dir.as_path());
    assert_eq!(options.plan_file_path.as_deref(), Some(std::path::Path::new(PLAN_FILE)));
    assert_eq!(options.vars["namespace"], run.settings.argocd_test_namespace.as_str());
}

#[tokio::test]
#[ignore = "needs terraform and provider downloads"]
async fn argocd_module_plans_cleanly() {
    let run = live();
    argocd_module_plan(&run.terraform, &run.settings).await.unwrap();
}
