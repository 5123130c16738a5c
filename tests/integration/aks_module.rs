use reliability_infra::scenarios::aks_module_only;

use crate::common::live;

#[tokio::test]
#[ignore = "provisions a real AKS cluster"]
async fn aks_module_outputs_cluster_id_and_name() {
    let run = live();
    aks_module_only(&run.terraform, &run.commands, &run.settings, &run.id)
        .await
        .unwrap();
}
